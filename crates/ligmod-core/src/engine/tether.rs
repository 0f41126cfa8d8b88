use super::error::EngineError;
use crate::core::models::conformer::Conformer;
use crate::core::models::molecule::Molecule;
use nalgebra::Point3;

/// Positional restraints biasing part of a molecule toward a reference
/// conformation.
///
/// Each anchor pairs an atom index in the target molecule with a fixed
/// reference position. Atoms without an anchor are entirely unconstrained;
/// this is how newly introduced atoms (added hydrogens, grown substituents)
/// stay free to find their own geometry while the conserved scaffold is
/// held in place.
#[derive(Debug, Clone, Default)]
pub struct Tethers {
    anchors: Vec<(usize, Point3<f64>)>,
}

impl Tethers {
    /// Builds tethers from explicit (atom index, reference position) pairs.
    pub fn from_anchors(
        target: &Molecule,
        anchors: Vec<(usize, Point3<f64>)>,
    ) -> Result<Self, EngineError> {
        for &(index, _) in &anchors {
            if index >= target.atom_count() {
                return Err(EngineError::TetherOutOfRange {
                    index,
                    atom_count: target.atom_count(),
                });
            }
        }
        Ok(Self { anchors })
    }

    /// Pairs the heavy atoms that `target` shares with `reference` by
    /// position in the atom list.
    ///
    /// A mutated molecule keeps its parent's atom ordering, with new atoms
    /// appended at the end, so index identity is the shared-atom relation:
    /// every index below both atom counts whose atom is heavy in both
    /// structures is anchored at the reference coordinate. Element identity
    /// is deliberately not compared: a substituted atom should stay where
    /// its predecessor sat.
    pub fn shared_heavy_atoms(
        target: &Molecule,
        reference: &Molecule,
    ) -> Result<Self, EngineError> {
        let reference_conformer = reference
            .conformer()
            .ok_or(EngineError::ReferenceWithoutConformer)?;

        let shared = target.atom_count().min(reference.atom_count());
        let mut anchors = Vec::new();
        for index in 0..shared {
            let target_heavy = target.atom(index).map(|a| a.is_heavy()).unwrap_or(false);
            let reference_heavy = reference.atom(index).map(|a| a.is_heavy()).unwrap_or(false);
            if target_heavy && reference_heavy {
                let position = reference_conformer
                    .position(index)
                    .expect("reference conformer covers its atoms");
                anchors.push((index, *position));
            }
        }
        Ok(Self { anchors })
    }

    pub fn anchors(&self) -> &[(usize, Point3<f64>)] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// RMSD of the anchored atoms from their reference positions under the
    /// given conformer, or `None` when there are no anchors.
    pub fn rmsd(&self, conformer: &Conformer) -> Option<f64> {
        if self.anchors.is_empty() {
            return None;
        }
        let sum: f64 = self
            .anchors
            .iter()
            .filter_map(|(index, anchor)| {
                conformer
                    .position(*index)
                    .map(|p| (p - anchor).norm_squared())
            })
            .sum();
        Some((sum / self.anchors.len() as f64).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use crate::core::models::topology::BondOrder;

    fn molecule_with_conformer(elements: &[Element]) -> Molecule {
        let mut mol = Molecule::new();
        for &el in elements {
            mol.add_atom(Atom::new(el));
        }
        for i in 1..elements.len() {
            mol.add_bond(i - 1, i, BondOrder::Single).unwrap();
        }
        let positions = (0..elements.len())
            .map(|i| Point3::new(1.5 * i as f64, 0.0, 0.0))
            .collect();
        mol.set_conformer(Conformer::new(positions)).unwrap();
        mol
    }

    #[test]
    fn shared_heavy_atoms_skip_hydrogens_on_either_side() {
        let reference = molecule_with_conformer(&[Element::C, Element::H, Element::O]);
        let mut target = reference.clone();
        target.set_element(1, Element::N).unwrap();

        let tethers = Tethers::shared_heavy_atoms(&target, &reference).unwrap();
        let anchored: Vec<usize> = tethers.anchors().iter().map(|(i, _)| *i).collect();
        // Index 1 is hydrogen in the reference, so it stays free even after
        // being substituted in the target.
        assert_eq!(anchored, vec![0, 2]);
    }

    #[test]
    fn appended_atoms_are_unconstrained() {
        let reference = molecule_with_conformer(&[Element::C, Element::C]);
        let mut target = reference.clone();
        let new_atom = target.add_atom(Atom::new(Element::O));
        target.add_bond(1, new_atom, BondOrder::Single).unwrap();

        let tethers = Tethers::shared_heavy_atoms(&target, &reference).unwrap();
        assert_eq!(tethers.len(), 2);
        assert!(tethers.anchors().iter().all(|(i, _)| *i < 2));
    }

    #[test]
    fn substituted_atoms_keep_their_reference_anchor() {
        let reference = molecule_with_conformer(&[Element::C, Element::C, Element::C]);
        let mut target = reference.clone();
        target.set_element(1, Element::N).unwrap();

        let tethers = Tethers::shared_heavy_atoms(&target, &reference).unwrap();
        assert_eq!(tethers.len(), 3);
    }

    #[test]
    fn reference_without_conformer_is_rejected() {
        let mut reference = Molecule::new();
        reference.add_atom(Atom::new(Element::C));
        let target = molecule_with_conformer(&[Element::C]);
        assert!(matches!(
            Tethers::shared_heavy_atoms(&target, &reference),
            Err(EngineError::ReferenceWithoutConformer)
        ));
    }

    #[test]
    fn explicit_anchor_out_of_range_is_rejected() {
        let target = molecule_with_conformer(&[Element::C]);
        let result = Tethers::from_anchors(&target, vec![(5, Point3::origin())]);
        assert!(matches!(
            result,
            Err(EngineError::TetherOutOfRange {
                index: 5,
                atom_count: 1
            })
        ));
    }

    #[test]
    fn rmsd_measures_anchor_deviation() {
        let reference = molecule_with_conformer(&[Element::C, Element::C]);
        let target = reference.clone();
        let tethers = Tethers::shared_heavy_atoms(&target, &reference).unwrap();

        assert!(tethers.rmsd(target.conformer().unwrap()).unwrap() < 1e-12);

        let shifted = Conformer::new(vec![
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(1.5, 3.0, 0.0),
        ]);
        assert!((tethers.rmsd(&shifted).unwrap() - 3.0).abs() < 1e-9);
    }
}
