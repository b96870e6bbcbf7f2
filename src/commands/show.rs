use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::cli::ShowArgs;
use crate::commands::open_existing_store;
use crate::model::CatalogRecord;
use crate::render::{TraceRenderer, render_record};
use crate::session::{ReviewSession, SessionState};

#[derive(Debug, Serialize)]
struct CurrentRecordView<'a> {
    done: bool,
    pending: i64,
    visible_beam_count: usize,
    record: Option<&'a CatalogRecord>,
}

pub fn run(args: ShowArgs) -> Result<()> {
    let store = open_existing_store(&args.store.db_path)?;
    let session = ReviewSession::start(store).context("failed to fetch the next galaxy")?;

    let pending = session.store().pending_count()?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        let view = CurrentRecordView {
            done: session.state() == SessionState::Done,
            pending,
            visible_beam_count: session.visible_beam_count(),
            record: session.current(),
        };
        serde_json::to_writer_pretty(&mut output, &view)
            .context("failed to serialize current galaxy")?;
        writeln!(output)?;
    } else {
        match session.current() {
            Some(record) => {
                writeln!(output, "{pending} galaxies pending")?;
                write_record(&mut output, record)?;
            }
            None => writeln!(output, "review complete, no galaxies pending")?,
        }
    }
    output.flush()?;

    if !args.skip_render && session.state() == SessionState::AwaitingInput {
        let mut renderer = TraceRenderer::default();
        if let Err(err) = render_record(&mut renderer, session.current()) {
            warn!(error = %err, "failed to render current galaxy");
        }
    }

    Ok(())
}

pub(crate) fn write_record(output: &mut impl Write, record: &CatalogRecord) -> Result<()> {
    writeln!(
        output,
        "galaxy {} ({} visible beam(s))",
        record.name,
        record.visible_beam_count()
    )?;
    for (index, beam) in record.beam_paths.iter().enumerate() {
        writeln!(output, "  beam{}: {beam}", index + 1)?;
    }
    writeln!(output, "  synthesis: {}", record.synthesis_path)?;
    if !record.aux_path.is_empty() {
        writeln!(output, "  sdss: {}", record.aux_path)?;
    }
    Ok(())
}
