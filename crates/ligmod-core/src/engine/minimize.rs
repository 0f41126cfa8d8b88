use super::error::EngineError;
use super::tether::Tethers;
use crate::core::chem::sanitize::sanitize;
use crate::core::forcefield::params;
use crate::core::forcefield::potentials;
use crate::core::models::conformer::Conformer;
use crate::core::models::molecule::Molecule;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Multiplier applied to the step size after an energy-lowering move.
const STEP_GROW: f64 = 1.2;
/// Multiplier applied after a rejected move.
const STEP_SHRINK: f64 = 0.5;
/// Step size below which the line search is considered stalled.
const STEP_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MinimizeConfig {
    /// Upper bound on descent iterations.
    pub max_iterations: usize,
    /// Convergence threshold on the root-mean-square force, kcal/(mol·Å).
    pub force_tolerance: f64,
    /// Largest displacement any single atom may take in one step, Angstroms.
    pub max_step: f64,
    /// Force constant of the tether restraints, kcal/(mol·Å²).
    pub tether_weight: f64,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        Self {
            max_iterations: 4000,
            force_tolerance: 5e-2,
            max_step: 0.2,
            tether_weight: 10.0,
        }
    }
}

/// Outcome of a successful minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizeReport {
    pub iterations: usize,
    pub initial_energy: f64,
    pub final_energy: f64,
    pub rms_force: f64,
}

/// Relaxes the molecule's conformation by steepest descent with an adaptive
/// step size.
///
/// The objective combines harmonic bond stretches, harmonic angle bends at
/// every bonded triple, a 12-6 nonbonded term over atom pairs separated by
/// three or more bonds, and (when tethers are given) harmonic restraints
/// pulling anchored atoms toward their reference positions.
///
/// # Errors
///
/// Requires a validated molecule with a conformer; returns
/// [`EngineError::Convergence`] when the force tolerance is not reached
/// within the iteration cap.
pub fn minimize(
    mol: &mut Molecule,
    tethers: Option<&Tethers>,
    config: &MinimizeConfig,
) -> Result<MinimizeReport, EngineError> {
    if !mol.is_validated() {
        sanitize(mol)?;
    }
    let conformer = mol.conformer().ok_or(EngineError::MissingConformer {
        operation: "minimize",
    })?;
    if let Some(tethers) = tethers {
        for &(index, _) in tethers.anchors() {
            if index >= mol.atom_count() {
                return Err(EngineError::TetherOutOfRange {
                    index,
                    atom_count: mol.atom_count(),
                });
            }
        }
    }

    let terms = Terms::build(mol, tethers, config.tether_weight);
    let mut positions: Vec<Point3<f64>> = conformer.positions().to_vec();

    let (mut energy, mut gradient) = terms.energy_and_gradient(&positions);
    let initial_energy = energy;
    let mut step = 1e-3;
    let mut iterations = 0;
    let mut rms = rms_force(&gradient);

    while iterations < config.max_iterations {
        if rms < config.force_tolerance {
            break;
        }
        iterations += 1;

        let trial = displaced(&positions, &gradient, step, config.max_step);
        let (trial_energy, trial_gradient) = terms.energy_and_gradient(&trial);
        if trial_energy < energy {
            positions = trial;
            energy = trial_energy;
            gradient = trial_gradient;
            rms = rms_force(&gradient);
            step = (step * STEP_GROW).min(0.1);
        } else {
            step *= STEP_SHRINK;
            if step < STEP_FLOOR {
                break;
            }
        }
        trace!(iterations, energy, rms, step, "descent step");
    }

    if rms >= config.force_tolerance {
        return Err(EngineError::Convergence {
            iterations,
            rms_force: rms,
        });
    }

    debug!(
        iterations,
        initial_energy, final_energy = energy, rms, "minimization converged"
    );
    mol.set_conformer(Conformer::new(positions))
        .expect("position count is unchanged");
    Ok(MinimizeReport {
        iterations,
        initial_energy,
        final_energy: energy,
        rms_force: rms,
    })
}

fn rms_force(gradient: &[Vector3<f64>]) -> f64 {
    if gradient.is_empty() {
        return 0.0;
    }
    let sum: f64 = gradient.iter().map(|g| g.norm_squared()).sum();
    (sum / gradient.len() as f64).sqrt()
}

fn displaced(
    positions: &[Point3<f64>],
    gradient: &[Vector3<f64>],
    step: f64,
    max_step: f64,
) -> Vec<Point3<f64>> {
    positions
        .iter()
        .zip(gradient)
        .map(|(p, g)| {
            let mut delta = -step * g;
            let norm = delta.norm();
            if norm > max_step {
                delta *= max_step / norm;
            }
            p + delta
        })
        .collect()
}

struct BondTerm {
    i: usize,
    j: usize,
    eq: f64,
}

struct AngleTerm {
    i: usize,
    center: usize,
    k: usize,
    eq: f64,
}

struct PairTerm {
    i: usize,
    j: usize,
    r_min: f64,
}

struct TetherTerm {
    i: usize,
    anchor: Point3<f64>,
    weight: f64,
}

/// Precomputed interaction lists over a fixed topology.
struct Terms {
    bonds: Vec<BondTerm>,
    angles: Vec<AngleTerm>,
    pairs: Vec<PairTerm>,
    tethers: Vec<TetherTerm>,
}

impl Terms {
    fn build(mol: &Molecule, tethers: Option<&Tethers>, tether_weight: f64) -> Self {
        let bonds: Vec<BondTerm> = mol
            .bonds()
            .iter()
            .map(|bond| BondTerm {
                i: bond.atom1,
                j: bond.atom2,
                eq: params::bond_length(
                    mol.atom(bond.atom1).expect("bond index in range").element,
                    mol.atom(bond.atom2).expect("bond index in range").element,
                    bond.order,
                ),
            })
            .collect();

        let mut angles = Vec::new();
        for center in 0..mol.atom_count() {
            let neighbors = mol.neighbors(center);
            if neighbors.len() < 2 {
                continue;
            }
            let eq = params::equilibrium_angle(mol, center);
            for a in 0..neighbors.len() {
                for b in (a + 1)..neighbors.len() {
                    angles.push(AngleTerm {
                        i: neighbors[a],
                        center,
                        k: neighbors[b],
                        eq,
                    });
                }
            }
        }

        // Pairs at bond distance 1 or 2 are handled by the bonded terms.
        let mut excluded: HashSet<(usize, usize)> = HashSet::new();
        for bond in mol.bonds() {
            excluded.insert(ordered(bond.atom1, bond.atom2));
        }
        for angle in &angles {
            excluded.insert(ordered(angle.i, angle.k));
        }

        let mut pairs = Vec::new();
        for i in 0..mol.atom_count() {
            for j in (i + 1)..mol.atom_count() {
                if excluded.contains(&(i, j)) {
                    continue;
                }
                pairs.push(PairTerm {
                    i,
                    j,
                    r_min: params::vdw_r_min(
                        mol.atom(i).expect("index in range").element,
                        mol.atom(j).expect("index in range").element,
                    ),
                });
            }
        }

        let tethers = tethers
            .map(|t| {
                t.anchors()
                    .iter()
                    .map(|&(i, anchor)| TetherTerm {
                        i,
                        anchor,
                        weight: tether_weight,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bonds,
            angles,
            pairs,
            tethers,
        }
    }

    fn energy_and_gradient(&self, positions: &[Point3<f64>]) -> (f64, Vec<Vector3<f64>>) {
        let mut energy = 0.0;
        let mut gradient = vec![Vector3::zeros(); positions.len()];

        for term in &self.bonds {
            let delta = positions[term.i] - positions[term.j];
            let dist = delta.norm();
            energy += potentials::harmonic(dist, term.eq, params::BOND_FORCE_CONSTANT);
            if dist > 1e-9 {
                let de = potentials::harmonic_deriv(dist, term.eq, params::BOND_FORCE_CONSTANT);
                let unit = delta / dist;
                gradient[term.i] += de * unit;
                gradient[term.j] -= de * unit;
            }
        }

        for term in &self.angles {
            let rij = positions[term.i] - positions[term.center];
            let rkj = positions[term.k] - positions[term.center];
            let (nij, nkj) = (rij.norm(), rkj.norm());
            if nij < 1e-9 || nkj < 1e-9 {
                continue;
            }
            let (uij, ukj) = (rij / nij, rkj / nkj);
            let cos_theta = uij.dot(&ukj).clamp(-1.0, 1.0);
            let theta = cos_theta.acos();
            energy += potentials::harmonic(theta, term.eq, params::ANGLE_FORCE_CONSTANT);

            let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
            if sin_theta < 1e-6 {
                continue;
            }
            let de = potentials::harmonic_deriv(theta, term.eq, params::ANGLE_FORCE_CONSTANT);
            let dtheta_di = (cos_theta * uij - ukj) / (nij * sin_theta);
            let dtheta_dk = (cos_theta * ukj - uij) / (nkj * sin_theta);
            gradient[term.i] += de * dtheta_di;
            gradient[term.k] += de * dtheta_dk;
            gradient[term.center] -= de * (dtheta_di + dtheta_dk);
        }

        for term in &self.pairs {
            let delta = positions[term.i] - positions[term.j];
            let dist = delta.norm();
            energy += potentials::lennard_jones_12_6(dist, term.r_min, params::VDW_WELL_DEPTH);
            if dist > 1e-6 {
                let de =
                    potentials::lennard_jones_12_6_deriv(dist, term.r_min, params::VDW_WELL_DEPTH);
                let unit = delta / dist;
                gradient[term.i] += de * unit;
                gradient[term.j] -= de * unit;
            }
        }

        for term in &self.tethers {
            let delta = positions[term.i] - term.anchor;
            energy += term.weight * delta.norm_squared();
            gradient[term.i] += 2.0 * term.weight * delta;
        }

        (energy, gradient)
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use crate::core::models::topology::BondOrder;
    use crate::core::utils::geometry;

    fn relaxed_config() -> MinimizeConfig {
        MinimizeConfig::default()
    }

    fn diatomic(stretch: f64) -> Molecule {
        let mut mol = Molecule::new();
        let a = mol.add_atom(Atom::new(Element::C).with_hydrogens(3));
        let b = mol.add_atom(Atom::new(Element::C).with_hydrogens(3));
        mol.add_bond(a, b, BondOrder::Single).unwrap();
        mol.set_conformer(Conformer::new(vec![
            Point3::origin(),
            Point3::new(stretch, 0.0, 0.0),
        ]))
        .unwrap();
        mol
    }

    #[test]
    fn stretched_bond_relaxes_to_its_equilibrium_length() {
        let mut mol = diatomic(2.2);
        let report = minimize(&mut mol, None, &relaxed_config()).unwrap();

        let eq = params::bond_length(Element::C, Element::C, BondOrder::Single);
        let conformer = mol.conformer().unwrap();
        let dist = (conformer.position(0).unwrap() - conformer.position(1).unwrap()).norm();
        assert!((dist - eq).abs() < 1e-2, "relaxed to {} expected {}", dist, eq);
        assert!(report.final_energy < report.initial_energy);
        assert!(report.rms_force < relaxed_config().force_tolerance);
    }

    #[test]
    fn compressed_angle_opens_toward_tetrahedral() {
        let mut mol = Molecule::new();
        let o = mol.add_atom(Atom::new(Element::O));
        let h1 = mol.add_atom(Atom::new(Element::H));
        let h2 = mol.add_atom(Atom::new(Element::H));
        mol.add_bond(o, h1, BondOrder::Single).unwrap();
        mol.add_bond(o, h2, BondOrder::Single).unwrap();
        mol.set_conformer(Conformer::new(vec![
            Point3::origin(),
            Point3::new(0.96, 0.0, 0.0),
            Point3::new(0.0, 0.96, 0.0),
        ]))
        .unwrap();

        minimize(&mut mol, None, &relaxed_config()).unwrap();

        let conformer = mol.conformer().unwrap();
        let angle = geometry::angle_between(
            conformer.position(1).unwrap(),
            conformer.position(0).unwrap(),
            conformer.position(2).unwrap(),
        )
        .unwrap();
        assert!(
            (angle.to_degrees() - 109.5).abs() < 2.0,
            "angle settled at {:.1} degrees",
            angle.to_degrees()
        );
    }

    #[test]
    fn tethered_atoms_stay_near_their_anchors() {
        let mut mol = diatomic(2.2);
        let anchors = vec![
            (0, Point3::origin()),
            (1, Point3::new(2.2, 0.0, 0.0)),
        ];
        let tethers = Tethers::from_anchors(&mol, anchors).unwrap();

        let strong = MinimizeConfig {
            tether_weight: 2000.0,
            ..MinimizeConfig::default()
        };
        minimize(&mut mol, Some(&tethers), &strong).unwrap();

        // A 2000 kcal/(mol Å²) restraint dominates the 300 stretch constant,
        // so the bond stays stretched instead of pulling the anchors in.
        let conformer = mol.conformer().unwrap();
        let dist = (conformer.position(0).unwrap() - conformer.position(1).unwrap()).norm();
        assert!(dist > 1.9, "tethers gave way, distance {}", dist);
        assert!(tethers.rmsd(conformer).unwrap() < 0.2);
    }

    #[test]
    fn minimizing_without_a_conformer_is_an_error() {
        let mut mol = Molecule::new();
        mol.add_atom(Atom::new(Element::C).with_hydrogens(4));
        let err = minimize(&mut mol, None, &relaxed_config()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingConformer {
                operation: "minimize"
            }
        ));
    }

    #[test]
    fn impossible_tolerance_reports_nonconvergence() {
        let mut mol = diatomic(2.2);
        let strict = MinimizeConfig {
            max_iterations: 3,
            force_tolerance: 1e-12,
            ..MinimizeConfig::default()
        };
        let err = minimize(&mut mol, None, &strict).unwrap_err();
        assert!(matches!(err, EngineError::Convergence { iterations: 3, .. }));
    }

    #[test]
    fn gradient_matches_a_finite_difference() {
        let mol = diatomic(1.8);
        let terms = Terms::build(&mol, None, 0.0);
        let positions = vec![Point3::origin(), Point3::new(1.8, 0.2, -0.1)];
        let (_, gradient) = terms.energy_and_gradient(&positions);

        let h = 1e-6;
        for atom in 0..positions.len() {
            for axis in 0..3 {
                let mut plus = positions.clone();
                let mut minus = positions.clone();
                plus[atom][axis] += h;
                minus[atom][axis] -= h;
                let numeric = (terms.energy_and_gradient(&plus).0
                    - terms.energy_and_gradient(&minus).0)
                    / (2.0 * h);
                assert!(
                    (numeric - gradient[atom][axis]).abs() < 1e-4,
                    "atom {} axis {}: numeric {} analytic {}",
                    atom,
                    axis,
                    numeric,
                    gradient[atom][axis]
                );
            }
        }
    }
}
