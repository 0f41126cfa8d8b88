//! # LIGMOD Core Library
//!
//! A library for index-addressed ligand editing: load a reference structure,
//! apply point mutations to its atoms, and regenerate a chemically sensible
//! 3D geometry that stays anchored to the original scaffold.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the stateless data model
//!   (`Molecule` and friends), chemical consistency checks, the empirical
//!   force-field terms, and SDF I/O.
//!
//! - **[`engine`]: The Logic Core.** Conformer generation and refinement:
//!   tether restraints against a reference, clash-checked embedding, and
//!   adaptive steepest-descent minimization.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level,
//!   user-facing layer. It ties the `engine` and `core` together to run the
//!   variant pipeline end to end, one edited derivative per output file.

pub mod core;
pub mod engine;
pub mod workflows;
