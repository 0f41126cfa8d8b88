use super::error::EngineError;
use super::tether::Tethers;
use crate::core::chem::sanitize::sanitize;
use crate::core::forcefield::params;
use crate::core::models::conformer::Conformer;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Spacing between disconnected fragments in a fresh embedding.
const FRAGMENT_SPACING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EmbedConfig {
    /// How many times to retry with fresh jitter before giving up.
    pub max_attempts: usize,
    /// Amplitude of the random displacement applied to tethered seeds, in
    /// Angstroms per axis.
    pub jitter: f64,
    /// Hard lower bound on any nonbonded interatomic distance; an attempt
    /// producing a closer contact is rejected.
    pub min_separation: f64,
    /// Fixed RNG seed for reproducible embeddings.
    pub seed: Option<u64>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            jitter: 0.15,
            min_separation: 0.7,
            seed: None,
        }
    }
}

/// Generates a 3D conformation for a validated molecule, optionally biased
/// toward a reference through [`Tethers`].
///
/// Tethered atoms seed at their anchor positions (plus jitter so repeated
/// attempts explore different basins); every other atom is grown outward
/// from an already-placed bonded neighbor using ideal bond lengths and
/// open-direction placement. The result is a rough but feasible geometry;
/// callers follow up with [`minimize`](super::minimize::minimize).
///
/// # Errors
///
/// Fails with a validity error when the molecule does not pass (or has not
/// passed) the sanity check, and with [`EngineError::Embedding`] when no
/// clash-free placement is found within the configured attempts.
pub fn embed(
    mol: &mut Molecule,
    tethers: Option<&Tethers>,
    config: &EmbedConfig,
) -> Result<(), EngineError> {
    if !mol.is_validated() {
        sanitize(mol)?;
    }
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

    let mut rng: StdRng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let attempts = config.max_attempts.max(1);
    let mut last_failure = String::new();
    for attempt in 1..=attempts {
        let positions = place_all(mol, tethers, config.jitter, &mut rng);
        match first_clash(mol, &positions, config.min_separation) {
            None => {
                debug!(attempt, "embedding accepted");
                mol.set_conformer(Conformer::new(positions))
                    .expect("placement covers every atom");
                return Ok(());
            }
            Some((i, j, dist)) => {
                last_failure = format!(
                    "atoms {} and {} collide at {:.2} A (attempt {})",
                    i, j, dist, attempt
                );
                debug!(attempt, failure = %last_failure, "embedding attempt rejected");
            }
        }
    }

    Err(EngineError::Embedding {
        attempts,
        reason: last_failure,
    })
}

fn jitter_vector(rng: &mut StdRng, amplitude: f64) -> Vector3<f64> {
    Vector3::new(
        (rng.r#gen::<f64>() - 0.5) * 2.0 * amplitude,
        (rng.r#gen::<f64>() - 0.5) * 2.0 * amplitude,
        (rng.r#gen::<f64>() - 0.5) * 2.0 * amplitude,
    )
}

fn place_all(
    mol: &Molecule,
    tethers: Option<&Tethers>,
    jitter: f64,
    rng: &mut StdRng,
) -> Vec<Point3<f64>> {
    let atom_count = mol.atom_count();
    let mut positions: Vec<Option<Point3<f64>>> = vec![None; atom_count];

    if let Some(tethers) = tethers {
        for &(index, anchor) in tethers.anchors() {
            positions[index] = Some(anchor + jitter_vector(rng, jitter));
        }
    }

    let mut component_of = vec![usize::MAX; atom_count];
    let mut component_count = 0;
    for start in 0..atom_count {
        if component_of[start] != usize::MAX {
            continue;
        }
        let members = collect_component(mol, start, component_count, &mut component_of);
        let seed = members
            .iter()
            .copied()
            .find(|&m| positions[m].is_some())
            .unwrap_or_else(|| {
                let first = members[0];
                positions[first] =
                    Some(Point3::new(FRAGMENT_SPACING * component_count as f64, 0.0, 0.0));
                first
            });
        grow_from_placed(mol, seed, &members, &mut positions);
        component_count += 1;
    }

    positions
        .into_iter()
        .map(|p| p.expect("every atom is placed by component growth"))
        .collect()
}

fn collect_component(
    mol: &Molecule,
    start: usize,
    component: usize,
    component_of: &mut [usize],
) -> Vec<usize> {
    let mut members = Vec::new();
    let mut queue = VecDeque::from([start]);
    component_of[start] = component;
    while let Some(node) = queue.pop_front() {
        members.push(node);
        for &next in mol.neighbors(node) {
            if component_of[next] == usize::MAX {
                component_of[next] = component;
                queue.push_back(next);
            }
        }
    }
    members
}

fn grow_from_placed(
    mol: &Molecule,
    seed: usize,
    members: &[usize],
    positions: &mut [Option<Point3<f64>>],
) {
    let mut queue: VecDeque<usize> = members
        .iter()
        .copied()
        .filter(|&m| positions[m].is_some())
        .collect();
    if queue.is_empty() {
        queue.push_back(seed);
    }

    while let Some(parent) = queue.pop_front() {
        let base = positions[parent].expect("queued atoms are placed");
        for &child in mol.neighbors(parent) {
            if positions[child].is_some() {
                continue;
            }
            let occupied: Vec<Point3<f64>> = mol
                .neighbors(parent)
                .iter()
                .filter_map(|&n| positions[n])
                .collect();
            let order = mol
                .bond_between(parent, child)
                .map(|b| b.order)
                .unwrap_or_default();
            let length = params::bond_length(
                mol.atom(parent).expect("index in range").element,
                mol.atom(child).expect("index in range").element,
                order,
            );
            let placed = geometry::placement_positions(&base, &occupied, 1, length);
            positions[child] = Some(placed[0]);
            queue.push_back(child);
        }
    }
}

fn first_clash(
    mol: &Molecule,
    positions: &[Point3<f64>],
    min_separation: f64,
) -> Option<(usize, usize, f64)> {
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if mol.bond_between(i, j).is_some() {
                continue;
            }
            let dist = (positions[i] - positions[j]).norm();
            if dist < min_separation {
                return Some((i, j, dist));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::sanitize::ValidityError;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use crate::core::models::topology::BondOrder;

    fn seeded() -> EmbedConfig {
        EmbedConfig {
            seed: Some(7),
            ..EmbedConfig::default()
        }
    }

    fn propanol_skeleton() -> Molecule {
        let mut mol = Molecule::new();
        let c1 = mol.add_atom(Atom::new(Element::C).with_hydrogens(3));
        let c2 = mol.add_atom(Atom::new(Element::C).with_hydrogens(2));
        let o = mol.add_atom(Atom::new(Element::O).with_hydrogens(1));
        mol.add_bond(c1, c2, BondOrder::Single).unwrap();
        mol.add_bond(c2, o, BondOrder::Single).unwrap();
        mol
    }

    #[test]
    fn embedding_from_scratch_places_every_atom_at_bond_length() {
        let mut mol = propanol_skeleton();
        embed(&mut mol, None, &seeded()).unwrap();

        let conformer = mol.conformer().unwrap();
        assert_eq!(conformer.len(), 3);
        let cc = (conformer.position(0).unwrap() - conformer.position(1).unwrap()).norm();
        let co = (conformer.position(1).unwrap() - conformer.position(2).unwrap()).norm();
        assert!((cc - params::bond_length(Element::C, Element::C, BondOrder::Single)).abs() < 1e-6);
        assert!((co - params::bond_length(Element::C, Element::O, BondOrder::Single)).abs() < 1e-6);
    }

    #[test]
    fn tethered_atoms_seed_near_their_anchors() {
        let mut reference = propanol_skeleton();
        embed(&mut reference, None, &seeded()).unwrap();

        let mut target = reference.clone();
        target.set_element(2, Element::N).unwrap();
        let tethers = Tethers::shared_heavy_atoms(&target, &reference).unwrap();
        assert_eq!(tethers.len(), 3);

        embed(&mut target, Some(&tethers), &seeded()).unwrap();
        let rmsd = tethers.rmsd(target.conformer().unwrap()).unwrap();
        assert!(rmsd < 0.5, "tethered rmsd {} too large", rmsd);
    }

    #[test]
    fn atoms_beyond_the_reference_are_grown_not_anchored() {
        let mut reference = propanol_skeleton();
        embed(&mut reference, None, &seeded()).unwrap();

        let mut target = reference.clone();
        let extra = target.add_atom(Atom::new(Element::C));
        target.add_bond(2, extra, BondOrder::Single).unwrap();
        // O now carries two substituents; keep the valence legal.
        target.set_explicit_hydrogens(2, 0).unwrap();

        let tethers = Tethers::shared_heavy_atoms(&target, &reference).unwrap();
        embed(&mut target, Some(&tethers), &seeded()).unwrap();

        let conformer = target.conformer().unwrap();
        let oc = (conformer.position(2).unwrap() - conformer.position(extra).unwrap()).norm();
        assert!((oc - params::bond_length(Element::O, Element::C, BondOrder::Single)).abs() < 1e-6);
    }

    #[test]
    fn invalid_structure_fails_validation_before_embedding() {
        let mut mol = Molecule::new();
        mol.add_atom(Atom::new(Element::C).with_hydrogens(5));
        let err = embed(&mut mol, None, &seeded()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validity {
                source: ValidityError::ValenceExceeded { .. }
            }
        ));
        assert!(mol.conformer().is_none());
    }

    #[test]
    fn seeded_embedding_is_reproducible() {
        let mut a = propanol_skeleton();
        let mut b = propanol_skeleton();
        embed(&mut a, None, &seeded()).unwrap();
        embed(&mut b, None, &seeded()).unwrap();
        assert_eq!(a.conformer(), b.conformer());
    }

    #[test]
    fn disconnected_fragments_are_separated() {
        let mut mol = Molecule::new();
        mol.add_atom(Atom::new(Element::Na).with_charge(1));
        mol.add_atom(Atom::new(Element::Cl).with_charge(-1));
        embed(&mut mol, None, &seeded()).unwrap();
        let conformer = mol.conformer().unwrap();
        let dist = (conformer.position(0).unwrap() - conformer.position(1).unwrap()).norm();
        assert!(dist >= FRAGMENT_SPACING - 1e-9);
    }
}
