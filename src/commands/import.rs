use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::{ImportOutcome, import_catalog};
use crate::cli::ImportArgs;

pub fn run(args: ImportArgs) -> Result<()> {
    info!(
        db_path = %args.store.db_path.display(),
        beam_dir = %args.data.beam_dir.display(),
        synthesis_dir = %args.data.synthesis_dir.display(),
        "starting import"
    );

    let outcome = import_catalog(
        &args.store.db_path,
        &args.data.beam_dir,
        &args.data.synthesis_dir,
    )
    .context("catalog import failed")?;

    match outcome {
        ImportOutcome::Imported { records } => info!(records, "import completed"),
        ImportOutcome::AlreadyPresent => info!("import skipped, catalog already present"),
    }

    Ok(())
}
