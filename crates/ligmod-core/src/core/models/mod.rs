//! Stateless data model for small-molecule structures: elements, atoms,
//! bonds, conformers, and the index-addressed [`molecule::Molecule`] that
//! ties them together.

pub mod atom;
pub mod conformer;
pub mod element;
pub mod molecule;
pub mod topology;
