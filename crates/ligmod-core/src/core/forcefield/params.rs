use crate::core::models::element::Element;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;

/// Stretch force constant for bonded pairs, kcal/(mol·Å²).
pub const BOND_FORCE_CONSTANT: f64 = 300.0;

/// Bend force constant for angle terms, kcal/(mol·rad²).
pub const ANGLE_FORCE_CONSTANT: f64 = 60.0;

/// Well depth for the nonbonded repulsion term, kcal/mol.
pub const VDW_WELL_DEPTH: f64 = 0.1;

/// Bond-order scaling of the single-bond covalent length.
fn order_factor(order: BondOrder) -> f64 {
    match order {
        BondOrder::Single => 1.0,
        BondOrder::Double => 0.87,
        BondOrder::Triple => 0.78,
        BondOrder::Aromatic => 0.915,
    }
}

/// Equilibrium length for a bond between two elements, in Angstroms.
pub fn bond_length(a: Element, b: Element, order: BondOrder) -> f64 {
    (a.covalent_radius() + b.covalent_radius()) * order_factor(order)
}

/// Distance at the minimum of the nonbonded pair potential, in Angstroms.
pub fn vdw_r_min(a: Element, b: Element) -> f64 {
    a.vdw_radius() + b.vdw_radius()
}

/// Equilibrium angle at `center`, in radians, inferred from the bond orders
/// the atom participates in: linear for triple bonds or cumulated doubles,
/// trigonal for any double or aromatic bond, tetrahedral otherwise.
pub fn equilibrium_angle(mol: &Molecule, center: usize) -> f64 {
    let mut doubles = 0;
    let mut has_sp2 = false;
    let mut has_triple = false;
    for bond in mol.bonds().iter().filter(|b| b.contains(center)) {
        match bond.order {
            BondOrder::Triple => has_triple = true,
            BondOrder::Double => {
                doubles += 1;
                has_sp2 = true;
            }
            BondOrder::Aromatic => has_sp2 = true,
            BondOrder::Single => {}
        }
    }
    if has_triple || doubles >= 2 {
        180.0f64.to_radians()
    } else if has_sp2 {
        120.0f64.to_radians()
    } else {
        109.5f64.to_radians()
    }
}
