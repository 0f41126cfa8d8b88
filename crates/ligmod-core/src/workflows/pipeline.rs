use super::config::{AtomEdit, PipelineConfig, VariantSpec};
use crate::core::chem::hydrogens;
use crate::core::chem::sanitize::{ValidityError, sanitize};
use crate::core::io::sdf::{SdfError, SdfFile, SdfMetadata};
use crate::core::io::traits::ChemicalFile;
use crate::core::io::{LoadError, load_ligand};
use crate::core::models::molecule::{EditError, Molecule};
use crate::engine::embed::embed;
use crate::engine::error::EngineError;
use crate::engine::minimize::{MinimizeReport, minimize};
use crate::engine::tether::Tethers;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// The pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embed,
    Minimize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Embed => write!(f, "embedding"),
            Stage::Minimize => write!(f, "minimization"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("variant '{variant}': edit of atom {atom} failed: {source}")]
    Edit {
        variant: String,
        atom: usize,
        #[source]
        source: EditError,
    },

    #[error("variant '{variant}': edited structure is chemically invalid: {source}")]
    Validity {
        variant: String,
        #[source]
        source: ValidityError,
    },

    #[error("variant '{variant}': hydrogen expansion failed: {source}")]
    Hydrogens {
        variant: String,
        #[source]
        source: EditError,
    },

    #[error("variant '{variant}' failed during {stage}: {source}")]
    Engine {
        variant: String,
        stage: Stage,
        #[source]
        source: EngineError,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: SdfError,
    },
}

/// Summary of one successfully produced variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantReport {
    pub name: String,
    pub output: PathBuf,
    pub atom_count: usize,
    pub heavy_atom_count: usize,
    pub optimized: bool,
    /// Heavy-atom deviation from the reference scaffold, when tethers
    /// applied.
    pub tether_rmsd: Option<f64>,
    pub minimization: Option<MinimizeReport>,
}

/// Produces one variant of the reference ligand: load, edit, validate,
/// expand hydrogens, embed tethered to the reference scaffold, minimize,
/// and write `<output-dir>/<name>.sdf`.
///
/// Variants marked `optimize = false` stop after validation and are written
/// with the reference coordinates untouched, which keeps a topology-only
/// edit inspectable without committing to a refined geometry.
///
/// Each call loads the reference afresh, so variants never see each other's
/// edits.
pub fn run_variant(
    config: &PipelineConfig,
    variant: &VariantSpec,
) -> Result<VariantReport, PipelineError> {
    let (reference, metadata) =
        load_ligand(&config.input, config.hydrogens).map_err(|source| PipelineError::Load {
            path: config.input.clone(),
            source,
        })?;
    info!(
        variant = %variant.name,
        atoms = reference.atom_count(),
        heavy = reference.heavy_atom_count(),
        "reference loaded"
    );

    let mut molecule = reference.clone();
    for edit in &variant.edits {
        apply_edit(&mut molecule, edit).map_err(|source| PipelineError::Edit {
            variant: variant.name.clone(),
            atom: edit.atom,
            source,
        })?;
    }
    sanitize(&mut molecule).map_err(|source| PipelineError::Validity {
        variant: variant.name.clone(),
        source,
    })?;

    let output = config.output_dir.join(format!("{}.sdf", variant.name));
    let out_metadata = SdfMetadata {
        title: variant.name.clone(),
        ..metadata
    };

    if !variant.optimize {
        info!(variant = %variant.name, "optimization disabled, writing edited topology as-is");
        SdfFile::write_to_path(&molecule, &out_metadata, &output).map_err(|source| {
            PipelineError::Write {
                path: output.clone(),
                source,
            }
        })?;
        return Ok(VariantReport {
            name: variant.name.clone(),
            output,
            atom_count: molecule.atom_count(),
            heavy_atom_count: molecule.heavy_atom_count(),
            optimized: false,
            tether_rmsd: None,
            minimization: None,
        });
    }

    let added = hydrogens::add_hydrogens(&mut molecule).map_err(|source| {
        PipelineError::Hydrogens {
            variant: variant.name.clone(),
            source,
        }
    })?;
    sanitize(&mut molecule).map_err(|source| PipelineError::Validity {
        variant: variant.name.clone(),
        source,
    })?;
    info!(variant = %variant.name, added, "hydrogens expanded");

    let tethers =
        Tethers::shared_heavy_atoms(&molecule, &reference).map_err(|source| {
            PipelineError::Engine {
                variant: variant.name.clone(),
                stage: Stage::Embed,
                source,
            }
        })?;
    embed(&mut molecule, Some(&tethers), &config.embed).map_err(|source| {
        PipelineError::Engine {
            variant: variant.name.clone(),
            stage: Stage::Embed,
            source,
        }
    })?;
    let minimization = minimize(&mut molecule, Some(&tethers), &config.minimize).map_err(
        |source| PipelineError::Engine {
            variant: variant.name.clone(),
            stage: Stage::Minimize,
            source,
        },
    )?;

    let tether_rmsd = molecule.conformer().and_then(|c| tethers.rmsd(c));
    info!(
        variant = %variant.name,
        iterations = minimization.iterations,
        energy = minimization.final_energy,
        rmsd = tether_rmsd,
        "geometry refined"
    );

    SdfFile::write_to_path(&molecule, &out_metadata, &output).map_err(|source| {
        PipelineError::Write {
            path: output.clone(),
            source,
        }
    })?;

    Ok(VariantReport {
        name: variant.name.clone(),
        output,
        atom_count: molecule.atom_count(),
        heavy_atom_count: molecule.heavy_atom_count(),
        optimized: true,
        tether_rmsd,
        minimization: Some(minimization),
    })
}

/// Runs every variant independently; one failure never blocks the rest.
pub fn run_all(
    config: &PipelineConfig,
    variants: &[VariantSpec],
) -> Vec<(String, Result<VariantReport, PipelineError>)> {
    variants
        .iter()
        .map(|variant| {
            let result = run_variant(config, variant);
            if let Err(error) = &result {
                warn!(variant = %variant.name, %error, "variant failed");
            }
            (variant.name.clone(), result)
        })
        .collect()
}

fn apply_edit(molecule: &mut Molecule, edit: &AtomEdit) -> Result<(), EditError> {
    if let Some(element) = edit.element {
        molecule.set_element(edit.atom, element)?;
    }
    if let Some(hydrogens) = edit.hydrogens {
        molecule.set_explicit_hydrogens(edit.atom, hydrogens)?;
    }
    if let Some(charge) = edit.charge {
        molecule.set_formal_charge(edit.atom, charge)?;
    }
    Ok(())
}
