use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use ligmod::core::io::HydrogenPolicy;
use ligmod::engine::embed::EmbedConfig;
use ligmod::engine::minimize::MinimizeConfig;
use ligmod::workflows::config::{PipelineConfig, VariantSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk shape of a run file: pipeline settings plus the variant list.
///
/// `input` and `output-dir` are optional here because the command line may
/// supply or override them; resolution fails if neither source provides an
/// input path.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RunFile {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub hydrogens: HydrogenPolicy,
    #[serde(default)]
    pub embed: EmbedConfig,
    #[serde(default)]
    pub minimize: MinimizeConfig,
    #[serde(default)]
    pub variants: Vec<VariantSpec>,
}

impl RunFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: RunFile =
            toml::from_str(&content).map_err(|source| CliError::FileParsing {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(?path, variants = file.variants.len(), "run file parsed");
        Ok(file)
    }

    /// Merges the run file with command-line overrides into the final
    /// pipeline configuration and variant list.
    pub fn resolve(self, args: &RunArgs) -> Result<(PipelineConfig, Vec<VariantSpec>)> {
        let input = args
            .input
            .clone()
            .or(self.input)
            .ok_or_else(|| {
                CliError::Config(
                    "no input ligand given; set 'input' in the run file or pass --input"
                        .to_string(),
                )
            })?;
        let output_dir = args
            .output_dir
            .clone()
            .or(self.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        if self.variants.is_empty() {
            return Err(CliError::Config(
                "run file defines no variants".to_string(),
            ));
        }

        let mut embed = self.embed;
        if args.seed.is_some() {
            embed.seed = args.seed;
        }

        Ok((
            PipelineConfig {
                input,
                output_dir,
                hydrogens: self.hydrogens,
                embed,
                minimize: self.minimize,
            },
            self.variants,
        ))
    }
}
