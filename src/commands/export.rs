use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ExportArgs;
use crate::commands::open_existing_store;
use crate::model::ResultsExport;
use crate::util::{now_utc_string, write_json_pretty};

pub fn run(args: ExportArgs) -> Result<()> {
    let store = open_existing_store(&args.store.db_path)?;
    let results = store.list_results().context("failed to read results")?;

    let export = ResultsExport {
        export_version: 1,
        generated_at: now_utc_string(),
        db_path: args.store.db_path.display().to_string(),
        result_count: results.len(),
        results,
    };

    write_json_pretty(&args.output, &export)?;
    info!(
        path = %args.output.display(),
        results = export.result_count,
        "wrote results export"
    );

    Ok(())
}
