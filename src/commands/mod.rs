use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::store::{Store, catalog_already_exists};

pub mod export;
pub mod import;
pub mod judgment;
pub mod review;
pub mod show;
pub mod status;
pub mod submit;

fn open_existing_store(db_path: &Path) -> Result<Store> {
    if !catalog_already_exists(db_path)? {
        bail!(
            "no catalog database at {}, run import first",
            db_path.display()
        );
    }
    Store::open(db_path).with_context(|| format!("failed to open {}", db_path.display()))
}
