use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use ligmod::core::io::{HydrogenPolicy, load_ligand};

/// Prints the atom table of a ligand, one zero-based index per row, so edit
/// targets in a run file can be chosen by eye.
pub fn run(args: InspectArgs) -> Result<()> {
    let policy = if args.strip_hydrogens {
        HydrogenPolicy::Strip
    } else {
        HydrogenPolicy::Retain
    };
    let (molecule, metadata) = load_ligand(&args.input, policy)?;

    if let Some(index) = args.atom {
        if index >= molecule.atom_count() {
            return Err(CliError::Config(format!(
                "atom {} is out of range ({} atoms)",
                index,
                molecule.atom_count()
            )));
        }
    }

    let title = if metadata.title.is_empty() {
        "(untitled)"
    } else {
        &metadata.title
    };
    println!(
        "{}: {} atoms ({} heavy), {} bonds",
        title,
        molecule.atom_count(),
        molecule.heavy_atom_count(),
        molecule.bond_count()
    );
    println!(
        "{:>5}  {:>7}  {:>3}  {:>6}  {:>30}  neighbors",
        "atom", "element", "Hs", "charge", "position"
    );
    for (index, atom) in molecule.atoms().iter().enumerate() {
        if args.atom.is_some_and(|wanted| wanted != index) {
            continue;
        }
        let position = molecule
            .conformer()
            .and_then(|c| c.position(index))
            .map(|p| format!("{:>9.4} {:>9.4} {:>9.4}", p.x, p.y, p.z))
            .unwrap_or_else(|| "-".to_string());
        let neighbors = molecule
            .neighbors(index)
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:>5}  {:>7}  {:>3}  {:>+6}  {:>30}  {}",
            index,
            atom.element.symbol(),
            atom.explicit_hydrogens,
            atom.formal_charge,
            position,
            neighbors
        );
    }

    Ok(())
}
