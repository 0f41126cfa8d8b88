use crate::core::io::HydrogenPolicy;
use crate::core::models::element::Element;
use crate::engine::embed::EmbedConfig;
use crate::engine::minimize::MinimizeConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings shared by every variant of a run: where the reference ligand
/// comes from, where results go, and how the geometry engine is tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Reference ligand structure (SDF).
    pub input: PathBuf,
    /// Directory receiving one `<variant>.sdf` per variant.
    pub output_dir: PathBuf,
    #[serde(default)]
    pub hydrogens: HydrogenPolicy,
    #[serde(default)]
    pub embed: EmbedConfig,
    #[serde(default)]
    pub minimize: MinimizeConfig,
}

/// A single point edit addressed by zero-based atom index. Fields left
/// unset keep the atom's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AtomEdit {
    pub atom: usize,
    #[serde(default)]
    pub element: Option<Element>,
    #[serde(default)]
    pub hydrogens: Option<u8>,
    #[serde(default)]
    pub charge: Option<i8>,
}

/// One named derivative of the reference ligand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VariantSpec {
    /// Output file stem; also the title of the written SDF record.
    pub name: String,
    #[serde(default)]
    pub edits: Vec<AtomEdit>,
    /// When false, the edited topology is written out as-is (reference
    /// coordinates, no hydrogen expansion, no refinement).
    #[serde(default = "default_optimize")]
    pub optimize: bool,
}

fn default_optimize() -> bool {
    true
}
