use super::atom::Atom;
use super::conformer::Conformer;
use super::element::Element;
use super::topology::{Bond, BondOrder};
use nalgebra::Point3;
use thiserror::Error;

/// Whether a molecule's chemistry has been checked since it was last
/// structurally modified.
///
/// Every edit that can change chemical meaning (element swaps, hydrogen
/// counts, charges, bond or atom insertion/removal) downgrades the state to
/// `Unvalidated`; only the sanitizer upgrades it back. Geometry-only changes
/// (conformer replacement, coordinate updates) do not affect it. Consumers
/// that require chemically sound input check this tag instead of trusting
/// the caller to have revalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    #[default]
    Unvalidated,
    Validated,
}

/// Errors from structural edits on a [`Molecule`].
///
/// A failed edit leaves the molecule exactly as it was; there are no
/// partial mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("atom index {index} is out of range (molecule has {atom_count} atoms)")]
    IndexOutOfRange { index: usize, atom_count: usize },

    #[error("bond {atom1}-{atom2} references an atom out of range (molecule has {atom_count} atoms)")]
    BondOutOfRange {
        atom1: usize,
        atom2: usize,
        atom_count: usize,
    },

    #[error("atom {index} cannot bond to itself")]
    SelfBond { index: usize },

    #[error("atoms {atom1} and {atom2} are already bonded")]
    DuplicateBond { atom1: usize, atom2: usize },

    #[error("conformer has {positions} positions but the molecule has {atom_count} atoms")]
    ConformerLengthMismatch {
        positions: usize,
        atom_count: usize,
    },

    #[error("molecule has no conformer")]
    NoConformer,
}

/// An in-memory small-molecule structure graph.
///
/// Atoms are addressed by their zero-based position in the atom list, fixed
/// at construction (parse) time and stable until atoms are removed. Bonds
/// reference those indices. An optional [`Conformer`] carries one 3D
/// coordinate per atom. The [`Validation`] tag makes the
/// "unvalidated after mutation" state explicit so that downstream geometry
/// operations can refuse chemically unchecked input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    conformer: Option<Conformer>,
    adjacency: Vec<Vec<usize>>,
    validation: Validation,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    // --- read access ---

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of non-hydrogen atoms in the atom list.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.is_heavy()).count()
    }

    /// Total hydrogen count: explicit H atoms in the list plus folded
    /// per-atom hydrogen counts.
    pub fn total_hydrogen_count(&self) -> usize {
        self.atoms
            .iter()
            .map(|a| {
                let folded = a.explicit_hydrogens as usize;
                if a.element.is_hydrogen() {
                    folded + 1
                } else {
                    folded
                }
            })
            .sum()
    }

    pub fn bond(&self, index: usize) -> Option<&Bond> {
        self.bonds.get(index)
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Indices of atoms bonded to `index`. Empty for out-of-range indices.
    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The bond connecting `atom1` and `atom2`, if any.
    pub fn bond_between(&self, atom1: usize, atom2: usize) -> Option<&Bond> {
        self.bonds
            .iter()
            .find(|b| b.contains(atom1) && b.contains(atom2))
    }

    pub fn conformer(&self) -> Option<&Conformer> {
        self.conformer.as_ref()
    }

    pub fn validation(&self) -> Validation {
        self.validation
    }

    pub fn is_validated(&self) -> bool {
        self.validation == Validation::Validated
    }

    pub(crate) fn mark_validated(&mut self) {
        self.validation = Validation::Validated;
    }

    // --- construction ---

    /// Appends an atom and returns its index. If a conformer is present the
    /// new atom is placed at the origin until positioned explicitly.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        let index = self.atoms.len();
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        if let Some(conformer) = self.conformer.as_mut() {
            conformer.push(Point3::origin());
        }
        self.validation = Validation::Unvalidated;
        index
    }

    /// Adds a bond between two existing atoms and returns its index.
    pub fn add_bond(
        &mut self,
        atom1: usize,
        atom2: usize,
        order: BondOrder,
    ) -> Result<usize, EditError> {
        let atom_count = self.atoms.len();
        if atom1 >= atom_count || atom2 >= atom_count {
            return Err(EditError::BondOutOfRange {
                atom1,
                atom2,
                atom_count,
            });
        }
        if atom1 == atom2 {
            return Err(EditError::SelfBond { index: atom1 });
        }
        if self.bond_between(atom1, atom2).is_some() {
            return Err(EditError::DuplicateBond { atom1, atom2 });
        }
        let index = self.bonds.len();
        self.bonds.push(Bond::new(atom1, atom2, order));
        self.adjacency[atom1].push(atom2);
        self.adjacency[atom2].push(atom1);
        self.validation = Validation::Unvalidated;
        Ok(index)
    }

    // --- per-atom mutation ---

    /// Changes the element identity of one atom. All other atoms, all
    /// bonds, and all coordinates are untouched. The molecule becomes
    /// unvalidated; no consistency repair is attempted.
    pub fn set_element(&mut self, index: usize, element: Element) -> Result<(), EditError> {
        let atom = self.checked_atom_mut(index)?;
        atom.element = element;
        self.validation = Validation::Unvalidated;
        Ok(())
    }

    /// Sets the folded hydrogen count of one atom.
    pub fn set_explicit_hydrogens(&mut self, index: usize, count: u8) -> Result<(), EditError> {
        let atom = self.checked_atom_mut(index)?;
        atom.explicit_hydrogens = count;
        self.validation = Validation::Unvalidated;
        Ok(())
    }

    /// Sets the formal charge of one atom.
    pub fn set_formal_charge(&mut self, index: usize, charge: i8) -> Result<(), EditError> {
        let atom = self.checked_atom_mut(index)?;
        atom.formal_charge = charge;
        self.validation = Validation::Unvalidated;
        Ok(())
    }

    fn checked_atom_mut(&mut self, index: usize) -> Result<&mut Atom, EditError> {
        let atom_count = self.atoms.len();
        self.atoms
            .get_mut(index)
            .ok_or(EditError::IndexOutOfRange { index, atom_count })
    }

    // --- geometry ---

    /// Installs a conformer. The position count must match the atom count.
    /// Geometry changes do not downgrade the validation state.
    pub fn set_conformer(&mut self, conformer: Conformer) -> Result<(), EditError> {
        if conformer.len() != self.atoms.len() {
            return Err(EditError::ConformerLengthMismatch {
                positions: conformer.len(),
                atom_count: self.atoms.len(),
            });
        }
        self.conformer = Some(conformer);
        Ok(())
    }

    pub fn clear_conformer(&mut self) {
        self.conformer = None;
    }

    /// Updates one atom's position in the current conformer.
    pub fn set_position(&mut self, index: usize, position: Point3<f64>) -> Result<(), EditError> {
        let atom_count = self.atoms.len();
        if index >= atom_count {
            return Err(EditError::IndexOutOfRange { index, atom_count });
        }
        let conformer = self.conformer.as_mut().ok_or(EditError::NoConformer)?;
        conformer.set_position(index, position);
        Ok(())
    }

    // --- removal ---

    /// Keeps only the atoms for which `keep` returns true, dropping bonds
    /// incident to removed atoms and compacting the conformer. Returns the
    /// old-index to new-index mapping (`None` for removed atoms).
    ///
    /// This reindexes the atom list: indices held by callers are invalid
    /// afterwards, which is why removal only happens at load time.
    pub fn retain_atoms<F>(&mut self, mut keep: F) -> Vec<Option<usize>>
    where
        F: FnMut(usize, &Atom) -> bool,
    {
        let kept: Vec<bool> = self
            .atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| keep(i, atom))
            .collect();

        let mut mapping = Vec::with_capacity(self.atoms.len());
        let mut next = 0;
        for &k in &kept {
            if k {
                mapping.push(Some(next));
                next += 1;
            } else {
                mapping.push(None);
            }
        }

        let mut index = 0;
        self.atoms.retain(|_| {
            let k = kept[index];
            index += 1;
            k
        });

        self.bonds.retain_mut(|bond| {
            match (mapping[bond.atom1], mapping[bond.atom2]) {
                (Some(a1), Some(a2)) => {
                    bond.atom1 = a1;
                    bond.atom2 = a2;
                    true
                }
                _ => false,
            }
        });

        if let Some(conformer) = self.conformer.as_mut() {
            conformer.retain_indices(&kept);
        }

        self.rebuild_adjacency();
        self.validation = Validation::Unvalidated;
        mapping
    }

    fn rebuild_adjacency(&mut self) {
        self.adjacency = vec![Vec::new(); self.atoms.len()];
        for bond in &self.bonds {
            self.adjacency[bond.atom1].push(bond.atom2);
            self.adjacency[bond.atom2].push(bond.atom1);
        }
    }
}
