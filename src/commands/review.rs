use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::catalog::import_catalog;
use crate::cli::ReviewArgs;
use crate::commands::judgment::{ReviewCommand, parse_review_line};
use crate::commands::show::write_record;
use crate::render::{PlotRenderer, TraceRenderer, render_record};
use crate::session::{ReviewSession, SessionState};
use crate::store::Store;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSummary {
    pub submitted: usize,
    pub skipped: usize,
    pub finished: bool,
}

pub fn run(args: ReviewArgs) -> Result<()> {
    import_catalog(
        &args.store.db_path,
        &args.data.beam_dir,
        &args.data.synthesis_dir,
    )
    .context("catalog import failed")?;

    let store = Store::open(&args.store.db_path)
        .with_context(|| format!("failed to open {}", args.store.db_path.display()))?;
    let mut session = ReviewSession::start(store).context("failed to fetch the next galaxy")?;

    let mut trace = TraceRenderer::default();
    let renderer: Option<&mut dyn PlotRenderer> = if args.skip_render {
        None
    } else {
        Some(&mut trace)
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = review_loop(
        &mut session,
        renderer,
        stdin.lock(),
        &mut stdout.lock(),
    )?;

    info!(
        submitted = summary.submitted,
        skipped = summary.skipped,
        finished = summary.finished,
        plots = trace.rendered(),
        "review session ended"
    );
    Ok(())
}

pub fn review_loop(
    session: &mut ReviewSession,
    mut renderer: Option<&mut dyn PlotRenderer>,
    input: impl BufRead,
    output: &mut impl Write,
) -> Result<ReviewSummary> {
    let mut summary = ReviewSummary::default();
    let mut lines = input.lines();
    let mut needs_render = true;

    while let Some(record) = session.current() {
        if needs_render {
            write_record(output, record)?;
            if let Some(renderer) = renderer.as_deref_mut() {
                match render_record(renderer, Some(record)) {
                    Ok(()) => {}
                    Err(err) if err.is_recoverable() => {
                        warn!(galaxy = %record.name, error = %err, "failed to render galaxy");
                        writeln!(output, "warning: {err}")?;
                    }
                    Err(err) => return Err(err).context("failed to render galaxy"),
                }
            }
            needs_render = false;
        }

        write!(
            output,
            "enter RFI,RIPPLE for {} beam(s) then SIGNAL,BASELINE (blank keeps defaults), 'skip' or 'quit': ",
            record.visible_beam_count()
        )?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line.context("failed to read reviewer input")?;

        let command = match parse_review_line(&line, record.visible_beam_count()) {
            Ok(command) => command,
            Err(err) => {
                writeln!(output, "error: {err}")?;
                continue;
            }
        };

        match command {
            ReviewCommand::Submit(judgment) => match session.submit(&judgment) {
                Ok(_) => {
                    summary.submitted += 1;
                    needs_render = true;
                }
                Err(err) if session.current().is_some() => {
                    warn!(error = %err, "judgment not saved");
                    writeln!(output, "error: {err}")?;
                }
                Err(err) => return Err(err).context("failed to fetch the next galaxy"),
            },
            ReviewCommand::Skip => {
                session.skip();
                summary.skipped += 1;
                writeln!(output, "not saved")?;
            }
            ReviewCommand::Quit => return Ok(summary),
        }
    }

    if session.state() == SessionState::Done {
        summary.finished = true;
        writeln!(output, "review complete, no galaxies pending")?;
    }
    output.flush()?;
    Ok(summary)
}
