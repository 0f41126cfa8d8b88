use crate::core::forcefield::params;
use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::molecule::{EditError, Molecule};
use crate::core::models::topology::BondOrder;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};

/// Expands every atom's folded hydrogen count into real H atoms.
///
/// New hydrogens are appended at the end of the atom list so that all
/// heavy-atom indices stay stable. Each hydrogen is single-bonded to its
/// parent and, when the molecule has a conformer, positioned from ideal
/// local geometry around the parent. Returns the number of atoms added.
///
/// The expansion structurally modifies the molecule, so it leaves it
/// unvalidated; callers re-run the sanitizer before geometry work.
pub fn add_hydrogens(mol: &mut Molecule) -> Result<usize, EditError> {
    let heavy_count = mol.atom_count();
    let mut added = 0;

    for parent in 0..heavy_count {
        let atom = *mol.atom(parent).expect("index in range");
        let count = atom.explicit_hydrogens as usize;
        if count == 0 {
            continue;
        }

        let bond_length = params::bond_length(atom.element, Element::H, BondOrder::Single);
        let positions = mol.conformer().map(|conformer| {
            let base = *conformer.position(parent).expect("conformer covers atom");
            let occupied: Vec<Point3<f64>> = mol
                .neighbors(parent)
                .iter()
                .filter_map(|&n| conformer.position(n).copied())
                .collect();
            let mut placed = geometry::placement_positions(&base, &occupied, count, bond_length);
            // Overcrowded centers can yield fewer directions than requested;
            // the minimizer untangles the leftovers.
            while placed.len() < count {
                let offset = Vector3::new(0.3 * (placed.len() as f64 + 1.0), 0.1, 0.0);
                placed.push(base + offset);
            }
            placed
        });

        for h in 0..count {
            let index = mol.add_atom(Atom::new(Element::H));
            mol.add_bond(parent, index, BondOrder::Single)?;
            if let Some(positions) = &positions {
                mol.set_position(index, positions[h])?;
            }
            added += 1;
        }
        mol.set_explicit_hydrogens(parent, 0)?;
    }

    Ok(added)
}

/// Folds removable explicit H atoms back into their heavy neighbor's
/// hydrogen count and compacts the atom list. Returns the number of atoms
/// removed.
///
/// A hydrogen is removable when it is neutral, carries no folded count of
/// its own, and is single-bonded to exactly one heavy atom. Anything else
/// (hydride ions, bridging or isolated hydrogens) stays in the list.
pub fn remove_hydrogens(mol: &mut Molecule) -> usize {
    let mut removable = vec![false; mol.atom_count()];
    let mut folded: Vec<u8> = mol
        .atoms()
        .iter()
        .map(|atom| atom.explicit_hydrogens)
        .collect();

    for index in 0..mol.atom_count() {
        let atom = mol.atom(index).expect("index in range");
        if !atom.element.is_hydrogen() || atom.formal_charge != 0 || atom.explicit_hydrogens != 0 {
            continue;
        }
        let neighbors = mol.neighbors(index);
        if neighbors.len() != 1 {
            continue;
        }
        let parent = neighbors[0];
        let parent_is_heavy = mol.atom(parent).map(|a| a.is_heavy()).unwrap_or(false);
        let single = mol
            .bond_between(index, parent)
            .map(|b| b.order == BondOrder::Single)
            .unwrap_or(false);
        if parent_is_heavy && single {
            removable[index] = true;
            folded[parent] += 1;
        }
    }

    let removed = removable.iter().filter(|&&r| r).count();
    if removed == 0 {
        return 0;
    }

    for (index, count) in folded.iter().enumerate() {
        let current = mol.atom(index).expect("index in range").explicit_hydrogens;
        if !removable[index] && *count != current {
            mol.set_explicit_hydrogens(index, *count)
                .expect("index in range");
        }
    }
    mol.retain_atoms(|index, _| !removable[index]);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::sanitize::sanitize;
    use crate::core::models::conformer::Conformer;

    fn folded_methane() -> Molecule {
        let mut mol = Molecule::new();
        mol.add_atom(Atom::new(Element::C).with_hydrogens(4));
        mol.set_conformer(Conformer::new(vec![Point3::origin()]))
            .unwrap();
        mol
    }

    #[test]
    fn expansion_appends_hydrogens_after_the_heavy_atoms() {
        let mut mol = folded_methane();
        let added = add_hydrogens(&mut mol).unwrap();
        assert_eq!(added, 4);
        assert_eq!(mol.atom_count(), 5);
        assert_eq!(mol.bond_count(), 4);
        assert_eq!(mol.atom(0).unwrap().element, Element::C);
        assert_eq!(mol.atom(0).unwrap().explicit_hydrogens, 0);
        for h in 1..5 {
            assert_eq!(mol.atom(h).unwrap().element, Element::H);
        }
    }

    #[test]
    fn expanded_hydrogens_sit_at_the_ideal_bond_length() {
        let mut mol = folded_methane();
        add_hydrogens(&mut mol).unwrap();
        let conformer = mol.conformer().unwrap();
        let expected = params::bond_length(Element::C, Element::H, BondOrder::Single);
        for h in 1..5 {
            let dist = (conformer.position(h).unwrap() - conformer.position(0).unwrap()).norm();
            assert!((dist - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn expansion_then_removal_restores_the_folded_form() {
        let mut mol = folded_methane();
        add_hydrogens(&mut mol).unwrap();
        let removed = remove_hydrogens(&mut mol);
        assert_eq!(removed, 4);
        assert_eq!(mol.atom_count(), 1);
        assert_eq!(mol.atom(0).unwrap().explicit_hydrogens, 4);
    }

    #[test]
    fn mutating_an_explicit_hydrogen_into_a_methyl_carbon_adds_three_atoms() {
        // The canonical exercise: grow a methyl group out of one hydrogen.
        let mut mol = Molecule::new();
        mol.add_atom(Atom::new(Element::C));
        for _ in 0..4 {
            let h = mol.add_atom(Atom::new(Element::H));
            mol.add_bond(0, h, BondOrder::Single).unwrap();
        }
        mol.set_conformer(Conformer::new(vec![
            Point3::origin(),
            Point3::new(1.09, 0.0, 0.0),
            Point3::new(-1.09, 0.0, 0.0),
            Point3::new(0.0, 1.09, 0.0),
            Point3::new(0.0, -1.09, 0.0),
        ]))
        .unwrap();
        let heavy_before = mol.heavy_atom_count();
        let total_before = mol.atom_count();

        mol.set_element(4, Element::C).unwrap();
        mol.set_explicit_hydrogens(4, 3).unwrap();
        sanitize(&mut mol).unwrap();
        add_hydrogens(&mut mol).unwrap();

        assert_eq!(mol.heavy_atom_count(), heavy_before + 1);
        assert_eq!(mol.atom_count(), total_before + 3);
    }

    #[test]
    fn charged_and_bridging_hydrogens_are_not_removed() {
        let mut mol = Molecule::new();
        let c = mol.add_atom(Atom::new(Element::C));
        let hydride = mol.add_atom(Atom::new(Element::H).with_charge(-1));
        let isolated = mol.add_atom(Atom::new(Element::H));
        mol.add_bond(c, hydride, BondOrder::Single).unwrap();
        let _ = isolated;

        assert_eq!(remove_hydrogens(&mut mol), 0);
        assert_eq!(mol.atom_count(), 3);
    }
}
