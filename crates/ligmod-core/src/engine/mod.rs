//! # Geometry Engine
//!
//! Conformer generation and refinement for edited ligands.
//!
//! ## Architecture
//!
//! - **Tethers** ([`tether`]) - positional restraints pairing a molecule's
//!   heavy atoms with reference coordinates
//! - **Embedding** ([`embed`]) - clash-checked initial placement, seeded
//!   from the tether anchors when present
//! - **Minimization** ([`minimize`]) - adaptive steepest descent over the
//!   force-field terms plus the tether restraints
//!
//! Both entry points validate their input first, so a structurally broken
//! molecule fails with a validity error before any geometry work happens.

pub mod embed;
pub mod error;
pub mod minimize;
pub mod tether;
