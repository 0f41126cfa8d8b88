use crate::core::chem::sanitize::ValidityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("structure failed validation: {source}")]
    Validity {
        #[from]
        source: ValidityError,
    },

    #[error("molecule has no conformation to {operation}")]
    MissingConformer { operation: &'static str },

    #[error("reference molecule has no conformation to tether against")]
    ReferenceWithoutConformer,

    #[error("tether references atom {index} outside the molecule ({atom_count} atoms)")]
    TetherOutOfRange { index: usize, atom_count: usize },

    #[error("no feasible embedding found after {attempts} attempt(s): {reason}")]
    Embedding { attempts: usize, reason: String },

    #[error(
        "minimization failed to converge after {iterations} iterations (rms force {rms_force:.3e})"
    )]
    Convergence { iterations: usize, rms_force: f64 },
}
