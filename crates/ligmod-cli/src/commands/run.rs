use crate::cli::RunArgs;
use crate::config::RunFile;
use crate::error::{CliError, Result};
use ligmod::workflows::pipeline::run_all;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let run_file = RunFile::load(&args.config)?;
    let (config, variants) = run_file.resolve(&args)?;

    info!(
        input = %config.input.display(),
        output_dir = %config.output_dir.display(),
        variants = variants.len(),
        "starting variant run"
    );

    let results = run_all(&config, &variants);
    let total = results.len();
    let mut failed = 0;

    for (name, result) in &results {
        match result {
            Ok(report) => {
                let rmsd = report
                    .tether_rmsd
                    .map(|r| format!(", scaffold rmsd {:.3} A", r))
                    .unwrap_or_default();
                println!(
                    "✅ {}: {} atoms ({} heavy){} -> {}",
                    name,
                    report.atom_count,
                    report.heavy_atom_count,
                    rmsd,
                    report.output.display()
                );
            }
            Err(error) => {
                failed += 1;
                eprintln!("❌ {}: {}", name, error);
            }
        }
    }

    if failed > 0 {
        Err(CliError::VariantsFailed { failed, total })
    } else {
        Ok(())
    }
}
