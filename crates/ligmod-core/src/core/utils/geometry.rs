use nalgebra::{Point3, Rotation3, Unit, Vector3};

const TETRAHEDRAL_ANGLE_DEG: f64 = 109.5;

/// Unit directions for attaching up to four new substituents around a
/// center, given the unit directions of the substituents already present.
///
/// With no existing neighbors the canonical tetrahedron is returned; with
/// one, two or three neighbors the remaining tetrahedral directions are
/// constructed around them. Callers take as many of the returned directions
/// as they need (sp2 centers simply consume fewer).
pub fn open_directions(existing: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    match existing.len() {
        0 => {
            let a = 1.0 / 3.0_f64.sqrt();
            vec![
                Vector3::new(a, a, a),
                Vector3::new(a, -a, -a),
                Vector3::new(-a, a, -a),
                Vector3::new(-a, -a, a),
            ]
        }
        1 => {
            let n1 = existing[0].normalize();
            let mut temp = if n1.x.abs() < 0.9 {
                Vector3::x()
            } else {
                Vector3::y()
            };
            temp = (temp - n1 * n1.dot(&temp)).normalize();

            let tilt = Rotation3::from_axis_angle(
                &Unit::new_normalize(n1.cross(&temp)),
                TETRAHEDRAL_ANGLE_DEG.to_radians(),
            );
            let spin = Rotation3::from_axis_angle(&Unit::new_normalize(n1), 120.0f64.to_radians());

            let d1 = (tilt * n1).normalize();
            let d2 = (spin * d1).normalize();
            let d3 = (spin * d2).normalize();
            vec![d1, d2, d3]
        }
        2 => {
            let n1 = existing[0].normalize();
            let n2 = existing[1].normalize();
            let bisector = -(n1 + n2).normalize();
            let out_of_plane = n1.cross(&n2);
            if out_of_plane.norm() < 1e-8 {
                // collinear neighbors: fall back to anything perpendicular
                return open_directions(&existing[..1]);
            }
            let axis = Unit::new_normalize(out_of_plane);
            let half = Rotation3::from_axis_angle(&axis, TETRAHEDRAL_ANGLE_DEG.to_radians() / 2.0);
            let d1 = (half * bisector).normalize();
            let d2 = (half.inverse() * bisector).normalize();
            vec![d1, d2]
        }
        _ => {
            let sum: Vector3<f64> = existing.iter().map(|v| v.normalize()).sum();
            if sum.norm() < 1e-8 {
                vec![Vector3::z()]
            } else {
                vec![(-sum).normalize()]
            }
        }
    }
}

/// Positions for attaching `count` new atoms around `base` at the given
/// bond length, steering clear of the already-occupied directions.
pub fn placement_positions(
    base: &Point3<f64>,
    occupied: &[Point3<f64>],
    count: usize,
    bond_length: f64,
) -> Vec<Point3<f64>> {
    let existing: Vec<Vector3<f64>> = occupied
        .iter()
        .filter_map(|p| {
            let v = p - base;
            if v.norm() < 1e-8 { None } else { Some(v) }
        })
        .collect();

    open_directions(&existing)
        .into_iter()
        .take(count)
        .map(|dir| base + dir * bond_length)
        .collect()
}

/// Root-mean-square deviation between two equally long coordinate sets.
pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// The i-j-k angle in radians, or `None` when either arm is degenerate.
pub fn angle_between(
    pi: &Point3<f64>,
    pj: &Point3<f64>,
    pk: &Point3<f64>,
) -> Option<f64> {
    let rij = pi - pj;
    let rkj = pk - pj;
    let denom = rij.norm() * rkj.norm();
    if denom < 1e-12 {
        return None;
    }
    Some((rij.dot(&rkj) / denom).clamp(-1.0, 1.0).acos())
}
