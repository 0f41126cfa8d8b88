use super::element::Element;

/// A single atom in a molecule's atom list.
///
/// An atom carries its chemical identity only; 3D coordinates live on the
/// molecule's conformer so a structure can exist with or without geometry.
/// The explicit-hydrogen count records hydrogens that belong to this atom
/// but are not themselves entries in the atom list (the folded form produced
/// by hydrogen stripping). Expanding them into real atoms is a separate,
/// explicit transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atom {
    /// The chemical element of this atom.
    pub element: Element,
    /// Hydrogens attached to this atom but not present in the atom list.
    pub explicit_hydrogens: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
}

impl Atom {
    /// Creates a neutral atom of the given element with no attached
    /// hydrogen count.
    pub fn new(element: Element) -> Self {
        Self {
            element,
            explicit_hydrogens: 0,
            formal_charge: 0,
        }
    }

    /// Builder-style helper used when constructing molecules by hand.
    pub fn with_hydrogens(mut self, count: u8) -> Self {
        self.explicit_hydrogens = count;
        self
    }

    /// Builder-style helper for charged atoms.
    pub fn with_charge(mut self, charge: i8) -> Self {
        self.formal_charge = charge;
        self
    }

    /// Whether this atom is a heavy (non-hydrogen) atom.
    pub fn is_heavy(&self) -> bool {
        !self.element.is_hydrogen()
    }
}
