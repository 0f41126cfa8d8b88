//! Empirical force-field terms used by the geometry engine.
//!
//! This is a teaching-scale harmonic model, not a research force field:
//! bond stretches and angle bends are simple harmonics parameterized from
//! covalent radii and inferred hybridization, nonbonded contacts use a
//! Lennard-Jones 12-6 form, and tether restraints are harmonic wells on
//! absolute positions. [`potentials`] holds the pure scalar functions with
//! their radial derivatives; [`params`] derives the per-pair parameters
//! from the element table.

pub mod params;
pub mod potentials;
