use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ReviewError;
use crate::model::{CatalogRecord, MAX_BEAMS};
use crate::store::{Store, catalog_already_exists};

const OS_NOISE_FILENAME: &str = ".DS_Store";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { records: usize },
    AlreadyPresent,
}

pub fn import_catalog(
    db_path: &Path,
    beam_dir: &Path,
    synthesis_dir: &Path,
) -> Result<ImportOutcome, ReviewError> {
    if catalog_already_exists(db_path)? {
        info!(path = %db_path.display(), "catalog already present, skipping import");
        return Ok(ImportOutcome::AlreadyPresent);
    }

    let records = build_catalog(beam_dir, synthesis_dir)?;

    let mut store = Store::open(db_path)?;
    let inserted = store.insert_many(&records)?;

    info!(
        path = %db_path.display(),
        records = inserted,
        "imported catalog"
    );
    Ok(ImportOutcome::Imported { records: inserted })
}

pub fn build_catalog(
    beam_dir: &Path,
    synthesis_dir: &Path,
) -> Result<Vec<CatalogRecord>, ReviewError> {
    let beam_files = list_filenames(beam_dir)?;
    let synthesis_files = list_filenames(synthesis_dir)?;

    let groups = group_by_name(beam_files.iter().map(String::as_str));
    let synthesis = synthesis_index(synthesis_files.iter().map(String::as_str));

    let mut records = Vec::with_capacity(groups.len());
    for (name, beams) in groups {
        if beams.len() > MAX_BEAMS {
            return Err(ReviewError::Configuration(format!(
                "galaxy {name} has {} beam files, at most {MAX_BEAMS} are supported",
                beams.len()
            )));
        }

        let synthesis_file = synthesis.get(&name).ok_or_else(|| {
            ReviewError::Configuration(format!(
                "no synthesis file for galaxy {name} in {}",
                synthesis_dir.display()
            ))
        })?;

        records.push(CatalogRecord {
            beam_paths: beams
                .iter()
                .map(|file| join_display(beam_dir, file))
                .collect(),
            synthesis_path: join_display(synthesis_dir, synthesis_file),
            aux_path: String::new(),
            name,
        });
    }

    if records.is_empty() {
        warn!(beam_dir = %beam_dir.display(), "no beam files found");
    }

    Ok(records)
}

pub fn group_by_name<'a>(
    filenames: impl IntoIterator<Item = &'a str>,
) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for filename in filenames {
        if filename == OS_NOISE_FILENAME {
            continue;
        }
        let name = filename.split('_').next().unwrap_or(filename);

        match index.get(name) {
            Some(&position) => groups[position].1.push(filename.to_string()),
            None => {
                index.insert(name.to_string(), groups.len());
                groups.push((name.to_string(), vec![filename.to_string()]));
            }
        }
    }

    groups
}

pub fn synthesis_index<'a>(
    filenames: impl IntoIterator<Item = &'a str>,
) -> HashMap<String, String> {
    filenames
        .into_iter()
        .filter(|filename| *filename != OS_NOISE_FILENAME)
        .map(|filename| {
            let stem = Path::new(filename)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(filename);
            (stem.to_string(), filename.to_string())
        })
        .collect()
}

fn list_filenames(dir: &Path) -> Result<Vec<String>, ReviewError> {
    let entries = fs::read_dir(dir).map_err(|err| {
        ReviewError::Configuration(format!("failed to read {}: {err}", dir.display()))
    })?;

    let mut filenames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            ReviewError::Configuration(format!(
                "failed to read entry in {}: {err}",
                dir.display()
            ))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(filename) => filenames.push(filename),
            Err(raw) => warn!(file = ?raw, "skipping non UTF-8 filename"),
        }
    }

    filenames.sort();
    Ok(filenames)
}

fn join_display(dir: &Path, filename: &str) -> String {
    let path: PathBuf = dir.join(filename);
    path.display().to_string()
}
