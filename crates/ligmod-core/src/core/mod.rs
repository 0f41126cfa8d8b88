//! # Core Module
//!
//! Fundamental building blocks for ligand editing: the molecular data
//! model, chemical consistency checks, file I/O, and the empirical
//! force-field terms consumed by the geometry engine.
//!
//! ## Architecture
//!
//! - **Molecular representation** ([`models`]) - index-addressed atoms,
//!   bonds, conformers and the validation-tagged `Molecule`
//! - **Chemistry** ([`chem`]) - sanitization and hydrogen expansion/folding
//! - **File I/O** ([`io`]) - SDF parsing and serialization behind a
//!   format-neutral trait
//! - **Force field** ([`forcefield`]) - harmonic and Lennard-Jones terms
//!   with parameters derived from the element table
//! - **Utilities** ([`utils`]) - small geometry helpers (RMSD, substituent
//!   placement)

pub mod chem;
pub mod forcefield;
pub mod io;
pub mod models;
pub mod utils;
