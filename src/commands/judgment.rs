use anyhow::{Context, Result, bail};

use crate::model::{BeamJudgment, JudgmentInput, SynthesisJudgment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    Submit(JudgmentInput),
    Skip,
    Quit,
}

pub fn parse_pair(raw: &str) -> Result<(u8, u8)> {
    let (first, second) = raw
        .split_once(',')
        .with_context(|| format!("expected two comma-separated flags, got '{raw}'"))?;

    let first = first
        .trim()
        .parse::<u8>()
        .with_context(|| format!("invalid flag '{first}' in '{raw}'"))?;
    let second = second
        .trim()
        .parse::<u8>()
        .with_context(|| format!("invalid flag '{second}' in '{raw}'"))?;

    Ok((first, second))
}

pub fn input_from_pairs(beams: &[String], synthesis: &str) -> Result<JudgmentInput> {
    let beams = beams
        .iter()
        .map(|raw| parse_pair(raw).map(|(rfi, ripple)| BeamJudgment::new(rfi, ripple)))
        .collect::<Result<Vec<_>>>()?;
    let (signal, baseline) = parse_pair(synthesis)?;

    Ok(JudgmentInput {
        beams,
        synthesis: SynthesisJudgment::new(signal, baseline),
    })
}

/// Reads one reviewer line.
///
/// A blank line keeps every default. Otherwise the line holds one pair per
/// visible beam followed by the synthesis pair.
pub fn parse_review_line(line: &str, visible_beams: usize) -> Result<ReviewCommand> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => return Ok(ReviewCommand::Submit(JudgmentInput::default())),
        "skip" | "n" | "no" => return Ok(ReviewCommand::Skip),
        "quit" | "q" | "exit" => return Ok(ReviewCommand::Quit),
        _ => {}
    }

    let tokens: Vec<String> = line.split_whitespace().map(ToOwned::to_owned).collect();
    if tokens.len() != visible_beams + 1 {
        bail!(
            "expected {} beam pair(s) and one synthesis pair, got {} pair(s)",
            visible_beams,
            tokens.len()
        );
    }

    let (synthesis, beams) = tokens
        .split_last()
        .context("missing synthesis pair")?;
    input_from_pairs(beams, synthesis).map(ReviewCommand::Submit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pair_accepts_spaces_and_rejects_garbage() {
        assert_eq!(parse_pair("2,1").unwrap(), (2, 1));
        assert_eq!(parse_pair(" 3 , 2 ").unwrap(), (3, 2));
        assert!(parse_pair("3").is_err());
        assert!(parse_pair("a,1").is_err());
        assert!(parse_pair("1,-1").is_err());
    }

    #[test]
    fn blank_line_submits_defaults() {
        assert_eq!(
            parse_review_line("   ", 3).unwrap(),
            ReviewCommand::Submit(JudgmentInput::default())
        );
    }

    #[test]
    fn keywords_map_to_skip_and_quit() {
        assert_eq!(parse_review_line("skip", 1).unwrap(), ReviewCommand::Skip);
        assert_eq!(parse_review_line("No", 1).unwrap(), ReviewCommand::Skip);
        assert_eq!(parse_review_line("quit", 1).unwrap(), ReviewCommand::Quit);
    }

    #[test]
    fn pairs_fill_beams_then_synthesis() {
        let command = parse_review_line("1,1 2,2 3,1", 2).unwrap();
        assert_eq!(
            command,
            ReviewCommand::Submit(JudgmentInput {
                beams: vec![BeamJudgment::new(1, 1), BeamJudgment::new(2, 2)],
                synthesis: SynthesisJudgment::new(3, 1),
            })
        );
    }

    #[test]
    fn wrong_pair_count_is_rejected() {
        let err = parse_review_line("1,1 2,2", 2).unwrap_err();
        assert!(err.to_string().contains("expected 2 beam pair(s)"));
    }
}
