use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use rusqlite::{Connection, params};
use tracing::{debug, info, warn};

use crate::error::ReviewError;
use crate::model::{BeamJudgment, CatalogRecord, JudgmentRecord, MAX_BEAMS};

const SQLITE_HEADER_LEN: u64 = 100;
const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Returns true when `db_path` already holds a SQLite database.
///
/// A fresh `Connection::open` leaves a zero-length file behind, so presence
/// alone is not enough.
pub fn catalog_already_exists(db_path: &Path) -> Result<bool, ReviewError> {
    let metadata = match fs::metadata(db_path) {
        Ok(metadata) => metadata,
        Err(_) => return Ok(false),
    };
    if !metadata.is_file() || metadata.len() < SQLITE_HEADER_LEN {
        return Ok(false);
    }

    let mut header = [0_u8; 16];
    File::open(db_path)
        .and_then(|mut file| file.read_exact(&mut header))
        .map_err(|err| {
            ReviewError::Configuration(format!(
                "failed to read database header {}: {err}",
                db_path.display()
            ))
        })?;

    Ok(&header == SQLITE_MAGIC)
}

pub struct Store {
    connection: Connection,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self, ReviewError> {
        let connection =
            Connection::open(db_path).map_err(|source| ReviewError::StorageConnection {
                path: db_path.to_path_buf(),
                source,
            })?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        debug!(path = %db_path.display(), "opened store");
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, ReviewError> {
        let connection = Connection::open_in_memory()?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn insert_many(&mut self, records: &[CatalogRecord]) -> Result<usize, ReviewError> {
        let tx = self.connection.transaction()?;

        {
            let mut statement = tx.prepare(
                "
                INSERT INTO galaxies(galaxy_name, beam_file_path, synthesis_file_path, sdss_file_path)
                VALUES(?1, ?2, ?3, ?4)
                ",
            )?;

            for record in records {
                statement.execute(params![
                    &record.name,
                    serialize_path_list(&record.beam_paths)?,
                    &record.synthesis_path,
                    &record.aux_path,
                ])?;
            }
        }

        tx.commit()?;
        info!(count = records.len(), "inserted catalog records");
        Ok(records.len())
    }

    /// Oldest readable record by row id. Rows whose beam path list cannot be
    /// read are logged and passed over so they do not block the rest of the
    /// catalog; they stay in the table for `status` to report.
    pub fn fetch_one(&self) -> Result<Option<CatalogRecord>, ReviewError> {
        let mut statement = self.connection.prepare(
            "
            SELECT galaxy_name, beam_file_path, synthesis_file_path, sdss_file_path
            FROM galaxies
            ORDER BY id ASC
            ",
        )?;

        let mut rows = statement.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let beams_raw: String = row.get(1)?;

            match parse_beam_paths(&name, &beams_raw) {
                Ok(beam_paths) => {
                    return Ok(Some(CatalogRecord {
                        name,
                        beam_paths,
                        synthesis_path: row.get(2)?,
                        aux_path: row.get(3)?,
                    }));
                }
                Err(err) => warn!(galaxy = %name, error = %err, "skipping unreadable catalog row"),
            }
        }

        Ok(None)
    }

    pub fn unreadable_count(&self) -> Result<usize, ReviewError> {
        let mut statement = self
            .connection
            .prepare("SELECT galaxy_name, beam_file_path FROM galaxies")?;
        let mut rows = statement.query([])?;
        let mut count = 0;

        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let beams_raw: String = row.get(1)?;
            if parse_beam_paths(&name, &beams_raw).is_err() {
                count += 1;
            }
        }

        Ok(count)
    }

    pub fn commit_judgment(&mut self, judgment: &JudgmentRecord) -> Result<(), ReviewError> {
        let tx = self.connection.transaction()?;
        write_result(&tx, judgment)?;
        let removed = delete_galaxy(&tx, &judgment.galaxy_name)?;
        if removed == 0 {
            // Dropping `tx` rolls the result row back.
            return Err(ReviewError::StorageQueryMessage(format!(
                "galaxy {} is no longer in the catalog; judgment not saved",
                judgment.galaxy_name
            )));
        }
        tx.commit()?;
        Ok(())
    }

    pub fn pending_count(&self) -> Result<i64, ReviewError> {
        query_count(&self.connection, "SELECT COUNT(*) FROM galaxies")
    }

    pub fn result_count(&self) -> Result<i64, ReviewError> {
        query_count(&self.connection, "SELECT COUNT(*) FROM results")
    }

    pub fn list_results(&self) -> Result<Vec<JudgmentRecord>, ReviewError> {
        let mut statement = self.connection.prepare(
            "
            SELECT
              galaxy_name,
              beam1_rfi_flag, beam1_ripple_flag,
              beam2_rfi_flag, beam2_ripple_flag,
              beam3_rfi_flag, beam3_ripple_flag,
              beam4_rfi_flag, beam4_ripple_flag,
              synthesis_signal_flag, synthesis_baseline_flag
            FROM results
            ORDER BY id ASC
            ",
        )?;

        let mut rows = statement.query([])?;
        let mut out = Vec::new();

        while let Some(row) = rows.next()? {
            let mut beam_judgments = [BeamJudgment::HIDDEN; MAX_BEAMS];
            for (slot, judgment) in beam_judgments.iter_mut().enumerate() {
                *judgment = BeamJudgment::new(row.get(1 + slot * 2)?, row.get(2 + slot * 2)?);
            }
            out.push(JudgmentRecord {
                galaxy_name: row.get(0)?,
                beam_judgments,
                synthesis_signal_flag: row.get(9)?,
                synthesis_baseline_flag: row.get(10)?,
            });
        }

        Ok(out)
    }
}

fn configure_connection(connection: &Connection) -> Result<(), ReviewError> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<(), ReviewError> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS galaxies (
          id INTEGER PRIMARY KEY AUTOINCREMENT UNIQUE,
          galaxy_name TEXT NOT NULL UNIQUE,
          beam_file_path TEXT NOT NULL,
          synthesis_file_path TEXT NOT NULL,
          sdss_file_path TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS results (
          id INTEGER PRIMARY KEY AUTOINCREMENT UNIQUE,
          galaxy_name TEXT NOT NULL,
          beam1_rfi_flag INTEGER DEFAULT 0 NOT NULL,
          beam1_ripple_flag INTEGER DEFAULT 0 NOT NULL,
          beam2_rfi_flag INTEGER DEFAULT 0 NOT NULL,
          beam2_ripple_flag INTEGER DEFAULT 0 NOT NULL,
          beam3_rfi_flag INTEGER DEFAULT 0 NOT NULL,
          beam3_ripple_flag INTEGER DEFAULT 0 NOT NULL,
          beam4_rfi_flag INTEGER DEFAULT 0 NOT NULL,
          beam4_ripple_flag INTEGER DEFAULT 0 NOT NULL,
          synthesis_signal_flag INTEGER DEFAULT 0 NOT NULL,
          synthesis_baseline_flag INTEGER DEFAULT 0 NOT NULL
        );
        ",
    )?;
    Ok(())
}

fn write_result(connection: &Connection, judgment: &JudgmentRecord) -> Result<(), ReviewError> {
    let [beam1, beam2, beam3, beam4] = judgment.beam_judgments;
    connection.execute(
        "
        INSERT INTO results(
          galaxy_name,
          beam1_rfi_flag, beam1_ripple_flag,
          beam2_rfi_flag, beam2_ripple_flag,
          beam3_rfi_flag, beam3_ripple_flag,
          beam4_rfi_flag, beam4_ripple_flag,
          synthesis_signal_flag, synthesis_baseline_flag
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ",
        params![
            &judgment.galaxy_name,
            beam1.rfi,
            beam1.ripple,
            beam2.rfi,
            beam2.ripple,
            beam3.rfi,
            beam3.ripple,
            beam4.rfi,
            beam4.ripple,
            judgment.synthesis_signal_flag,
            judgment.synthesis_baseline_flag,
        ],
    )?;
    Ok(())
}

fn delete_galaxy(connection: &Connection, name: &str) -> Result<usize, ReviewError> {
    let affected = connection.execute("DELETE FROM galaxies WHERE galaxy_name = ?1", [name])?;
    Ok(affected)
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64, ReviewError> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

fn parse_beam_paths(name: &str, raw: &str) -> Result<Vec<String>, ReviewError> {
    let paths = parse_path_list(raw)
        .map_err(|err| ReviewError::DataFormat(format!("galaxy {name}: {err}")))?;
    if paths.is_empty() || paths.len() > MAX_BEAMS {
        return Err(ReviewError::DataFormat(format!(
            "galaxy {name}: expected 1 to {MAX_BEAMS} beam paths, found {}",
            paths.len()
        )));
    }
    Ok(paths)
}

pub fn serialize_path_list(paths: &[String]) -> Result<String, ReviewError> {
    serde_json::to_string(paths)
        .map_err(|err| ReviewError::DataFormat(format!("failed to serialize path list: {err}")))
}

/// Parses a stored beam path list.
///
/// Accepts a JSON array of strings, and also the single-quoted list literal
/// (`['a.fits', 'b.fits']`) found in catalogs written by older tooling.
pub fn parse_path_list(raw: &str) -> Result<Vec<String>, String> {
    if let Ok(paths) = serde_json::from_str::<Vec<String>>(raw) {
        return Ok(paths);
    }
    parse_quoted_list(raw)
}

fn parse_quoted_list(raw: &str) -> Result<Vec<String>, String> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| format!("path list is not a bracketed list: {raw}"))?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(quote) = chars.next() else {
            break;
        };
        if quote != '\'' && quote != '"' {
            return Err(format!("expected quoted path in list: {raw}"));
        }

        let mut item = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => item.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    closed = true;
                    break;
                }
                c => item.push(c),
            }
        }
        if !closed {
            return Err(format!("unterminated path in list: {raw}"));
        }
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') | None => {}
            Some(other) => return Err(format!("unexpected '{other}' in path list: {raw}")),
        }
    }

    Ok(items)
}
