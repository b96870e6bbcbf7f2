use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{Store, catalog_already_exists};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = &args.store.db_path;
    info!(db_path = %db_path.display(), "status requested");

    if !catalog_already_exists(db_path)? {
        warn!(path = %db_path.display(), "database file missing, run import first");
        return Ok(());
    }

    let store = Store::open(db_path).with_context(|| format!("failed to open {}", db_path.display()))?;
    let pending = store.pending_count()?;
    let reviewed = store.result_count()?;
    let unreadable = store.unreadable_count()?;
    let next = store.fetch_one().context("failed to fetch next galaxy")?;

    info!(
        path = %db_path.display(),
        pending,
        reviewed,
        unreadable,
        next = %next.as_ref().map(|record| record.name.as_str()).unwrap_or_default(),
        "database status"
    );

    Ok(())
}
