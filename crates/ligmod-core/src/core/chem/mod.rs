//! Chemical consistency checking and hydrogen transformations.
//!
//! [`sanitize`] is the gate between structural editing and geometry work:
//! a molecule must pass it to be accepted by the embedding and minimization
//! engine. [`hydrogens`] converts between the folded representation
//! (per-atom hydrogen counts) and explicit H atoms in the atom list.

pub mod hydrogens;
pub mod sanitize;
