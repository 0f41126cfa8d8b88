//! Reading and writing of ligand structure files.
//!
//! [`traits::ChemicalFile`] is the format-neutral interface; [`sdf`]
//! implements it for MDL molfiles / SD files. [`load_ligand`] is the
//! pipeline's loader entry point: parse, apply the hydrogen policy, and
//! run the implicit validity check the rest of the system relies on.

pub mod sdf;
pub mod traits;

use crate::core::chem::hydrogens;
use crate::core::chem::sanitize::{ValidityError, sanitize};
use crate::core::models::molecule::Molecule;
use sdf::{SdfError, SdfFile, SdfMetadata};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use traits::ChemicalFile;

/// What to do with explicit hydrogen atoms found in an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrogenPolicy {
    /// Keep hydrogen atoms as entries in the atom list, preserving the
    /// file's atom indices exactly.
    #[default]
    Retain,
    /// Fold removable hydrogens into their heavy neighbor's hydrogen
    /// count, compacting the atom list to heavy atoms.
    Strip,
}

/// A failure to produce a usable molecule from an input file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot parse input: {0}")]
    Parse(#[from] SdfError),
    #[error("input is chemically inconsistent: {0}")]
    Validity(#[from] ValidityError),
}

/// Loads a ligand structure from an SDF file, applies the hydrogen policy
/// and validates the result. The returned molecule is in the `Validated`
/// state with its conformer taken from the file.
///
/// # Errors
///
/// Fails when the file is absent or malformed ([`LoadError::Parse`]) or
/// when the parsed structure does not pass the validity check
/// ([`LoadError::Validity`]).
pub fn load_ligand<P: AsRef<Path>>(
    path: P,
    policy: HydrogenPolicy,
) -> Result<(Molecule, SdfMetadata), LoadError> {
    let (mut molecule, metadata) = SdfFile::read_from_path(path)?;
    if policy == HydrogenPolicy::Strip {
        hydrogens::remove_hydrogens(&mut molecule);
    }
    sanitize(&mut molecule)?;
    Ok((molecule, metadata))
}
