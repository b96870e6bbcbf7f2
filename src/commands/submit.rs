use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::warn;

use crate::cli::SubmitArgs;
use crate::commands::judgment::input_from_pairs;
use crate::commands::open_existing_store;
use crate::commands::show::write_record;
use crate::error::ReviewError;
use crate::model::JudgmentInput;
use crate::session::ReviewSession;

pub fn run(args: SubmitArgs) -> Result<()> {
    let store = open_existing_store(&args.store.db_path)?;
    let mut session = ReviewSession::start(store).context("failed to fetch the next galaxy")?;

    let visible = match session.current() {
        Some(record) => record.visible_beam_count(),
        None => return Err(ReviewError::NoCurrentRecord).context("nothing left to review"),
    };
    if args.beams.len() > visible {
        warn!(
            given = args.beams.len(),
            visible,
            "ignoring beam judgments past the visible beam count"
        );
    }

    let input = input_from_pairs(&args.beams, &args.synthesis)?;
    save_judgment(&mut session, &input)?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    match session.current() {
        Some(record) => {
            writeln!(output, "saved; next up:")?;
            write_record(&mut output, record)?;
        }
        None => writeln!(output, "saved; review complete, no galaxies pending")?,
    }
    output.flush()?;

    Ok(())
}

fn save_judgment(session: &mut ReviewSession, input: &JudgmentInput) -> Result<()> {
    if let Err(err) = session.submit(input) {
        // The record is only released once the judgment is committed.
        let context = if session.current().is_some() {
            "failed to save judgment"
        } else {
            "judgment saved; failed to fetch the next galaxy"
        };
        return Err(err).context(context);
    }
    Ok(())
}
