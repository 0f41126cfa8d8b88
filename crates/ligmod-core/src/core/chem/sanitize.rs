use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use thiserror::Error;

/// A chemical consistency defect found by [`sanitize`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidityError {
    #[error("molecule has no atoms")]
    Empty,

    #[error(
        "atom {index} ({element}) has valence {valence} exceeding the allowed {allowed} for charge {charge:+}"
    )]
    ValenceExceeded {
        index: usize,
        element: Element,
        valence: u32,
        allowed: u32,
        charge: i8,
    },

    #[error("aromatic bond between atoms {atom1} and {atom2} is not part of a ring")]
    AromaticBondOutsideRing { atom1: usize, atom2: usize },

    #[error("atom {index} has {count} aromatic bond(s); an aromatic atom requires 2 or 3")]
    AromaticBondCount { index: usize, count: usize },
}

/// Checks the molecule's valences and aromatic system and, on success,
/// marks it [`Validated`](crate::core::models::molecule::Validation).
///
/// The check is deliberately conservative: under-filled valences are
/// allowed (hydrogens may simply be absent), only exceeded valences are a
/// defect. Aromaticity is treated structurally: every aromatic bond must
/// close a ring and every atom touching aromatic bonds must have exactly
/// two or three of them.
pub fn sanitize(mol: &mut Molecule) -> Result<(), ValidityError> {
    if mol.atom_count() == 0 {
        return Err(ValidityError::Empty);
    }

    let ring = ring_bonds(mol);
    for (bond_index, bond) in mol.bonds().iter().enumerate() {
        if bond.order == BondOrder::Aromatic && !ring[bond_index] {
            return Err(ValidityError::AromaticBondOutsideRing {
                atom1: bond.atom1,
                atom2: bond.atom2,
            });
        }
    }

    for index in 0..mol.atom_count() {
        let atom = mol.atom(index).expect("index in range");

        let mut plain_sum = 0.0;
        let mut aromatic_count = 0usize;
        for bond in mol.bonds().iter().filter(|b| b.contains(index)) {
            if bond.order == BondOrder::Aromatic {
                aromatic_count += 1;
            } else {
                plain_sum += bond.order.valence_contribution();
            }
        }

        // Two aromatic bonds carry the Kekulé valence of 3, a fused-ring
        // junction with three carries 4.
        let aromatic_sum = match aromatic_count {
            0 => 0.0,
            2 => 3.0,
            3 => 4.0,
            count => {
                return Err(ValidityError::AromaticBondCount { index, count });
            }
        };

        let valence =
            (plain_sum + aromatic_sum).round() as u32 + atom.explicit_hydrogens as u32;
        let allowed = (atom.element.max_valence() as i32 + atom.formal_charge as i32).max(0) as u32;
        if valence > allowed {
            return Err(ValidityError::ValenceExceeded {
                index,
                element: atom.element,
                valence,
                allowed,
                charge: atom.formal_charge,
            });
        }
    }

    mol.mark_validated();
    Ok(())
}

/// Flags, per bond, whether the bond lies on a ring (i.e. is not a bridge
/// of the molecular graph).
pub fn ring_bonds(mol: &Molecule) -> Vec<bool> {
    let atom_count = mol.atom_count();
    let mut incident: Vec<Vec<(usize, usize)>> = vec![Vec::new(); atom_count];
    for (bond_index, bond) in mol.bonds().iter().enumerate() {
        incident[bond.atom1].push((bond.atom2, bond_index));
        incident[bond.atom2].push((bond.atom1, bond_index));
    }

    let mut state = BridgeState {
        incident: &incident,
        discovery: vec![0; atom_count],
        low: vec![0; atom_count],
        timer: 0,
        is_bridge: vec![false; mol.bond_count()],
    };
    for start in 0..atom_count {
        if state.discovery[start] == 0 {
            state.visit(start, usize::MAX);
        }
    }

    state.is_bridge.iter().map(|b| !b).collect()
}

struct BridgeState<'a> {
    incident: &'a [Vec<(usize, usize)>],
    discovery: Vec<usize>,
    low: Vec<usize>,
    timer: usize,
    is_bridge: Vec<bool>,
}

impl BridgeState<'_> {
    fn visit(&mut self, node: usize, via_bond: usize) {
        self.timer += 1;
        self.discovery[node] = self.timer;
        self.low[node] = self.timer;
        for &(next, bond_index) in &self.incident[node] {
            if bond_index == via_bond {
                continue;
            }
            if self.discovery[next] == 0 {
                self.visit(next, bond_index);
                self.low[node] = self.low[node].min(self.low[next]);
                if self.low[next] > self.discovery[node] {
                    self.is_bridge[bond_index] = true;
                }
            } else {
                self.low[node] = self.low[node].min(self.discovery[next]);
            }
        }
    }
}
