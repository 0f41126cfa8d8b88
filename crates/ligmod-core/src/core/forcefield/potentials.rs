#[inline]
pub fn harmonic(dist: f64, eq: f64, k: f64) -> f64 {
    let delta = dist - eq;
    k * delta * delta
}

/// dE/dr of [`harmonic`].
#[inline]
pub fn harmonic_deriv(dist: f64, eq: f64, k: f64) -> f64 {
    2.0 * k * (dist - eq)
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// dE/dr of [`lennard_jones_12_6`].
#[inline]
pub fn lennard_jones_12_6_deriv(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return -1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    -12.0 * well_depth * (rho12 - rho6) / dist
}
