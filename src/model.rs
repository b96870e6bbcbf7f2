use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

pub const MAX_BEAMS: usize = 4;

pub const RFI_FLAG_MAX: u8 = 3;
pub const RIPPLE_FLAG_MAX: u8 = 2;
pub const SIGNAL_FLAG_MAX: u8 = 3;
pub const BASELINE_FLAG_MAX: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    pub beam_paths: Vec<String>,
    pub synthesis_path: String,
    pub aux_path: String,
}

impl CatalogRecord {
    pub fn visible_beam_count(&self) -> usize {
        self.beam_paths.len().min(MAX_BEAMS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamJudgment {
    pub rfi: u8,
    pub ripple: u8,
}

impl BeamJudgment {
    pub const HIDDEN: BeamJudgment = BeamJudgment { rfi: 0, ripple: 0 };

    pub fn new(rfi: u8, ripple: u8) -> Self {
        Self { rfi, ripple }
    }
}

impl Default for BeamJudgment {
    fn default() -> Self {
        Self { rfi: 1, ripple: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisJudgment {
    pub signal: u8,
    pub baseline: u8,
}

impl SynthesisJudgment {
    pub fn new(signal: u8, baseline: u8) -> Self {
        Self { signal, baseline }
    }
}

impl Default for SynthesisJudgment {
    fn default() -> Self {
        Self {
            signal: 1,
            baseline: 1,
        }
    }
}

/// Reviewer choices collected for the current record.
///
/// `beams[i]` is the choice for beam slot `i + 1`. Visible slots without an
/// entry take the default choice; entries past the record's beam count are
/// never collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgmentInput {
    pub beams: Vec<BeamJudgment>,
    pub synthesis: SynthesisJudgment,
}

impl JudgmentInput {
    pub fn validate(&self, visible_beams: usize) -> Result<(), ReviewError> {
        for (index, beam) in self.beams.iter().take(visible_beams).enumerate() {
            check_flag(&format!("beam{} rfi", index + 1), beam.rfi, RFI_FLAG_MAX)?;
            check_flag(
                &format!("beam{} ripple", index + 1),
                beam.ripple,
                RIPPLE_FLAG_MAX,
            )?;
        }
        check_flag("synthesis signal", self.synthesis.signal, SIGNAL_FLAG_MAX)?;
        check_flag(
            "synthesis baseline",
            self.synthesis.baseline,
            BASELINE_FLAG_MAX,
        )?;
        Ok(())
    }
}

fn check_flag(label: &str, value: u8, max: u8) -> Result<(), ReviewError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(ReviewError::InvalidJudgment(format!(
            "{label} flag must be between 1 and {max}, got {value}"
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentRecord {
    pub galaxy_name: String,
    pub beam_judgments: [BeamJudgment; MAX_BEAMS],
    pub synthesis_signal_flag: u8,
    pub synthesis_baseline_flag: u8,
}

impl JudgmentRecord {
    pub fn from_input(record: &CatalogRecord, input: &JudgmentInput) -> Self {
        let visible = record.visible_beam_count();
        let mut beam_judgments = [BeamJudgment::HIDDEN; MAX_BEAMS];
        for (slot, judgment) in beam_judgments.iter_mut().enumerate().take(visible) {
            *judgment = input.beams.get(slot).copied().unwrap_or_default();
        }

        Self {
            galaxy_name: record.name.clone(),
            beam_judgments,
            synthesis_signal_flag: input.synthesis.signal,
            synthesis_baseline_flag: input.synthesis.baseline,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsExport {
    pub export_version: u32,
    pub generated_at: String,
    pub db_path: String,
    pub result_count: usize,
    pub results: Vec<JudgmentRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_beams(count: usize) -> CatalogRecord {
        CatalogRecord {
            name: "AGC100".to_string(),
            beam_paths: (1..=count).map(|i| format!("AGC100_b{i}.fits")).collect(),
            synthesis_path: "AGC100.fits".to_string(),
            aux_path: String::new(),
        }
    }

    #[test]
    fn hidden_beam_slots_are_zero_even_when_input_has_them() {
        let record = record_with_beams(2);
        let input = JudgmentInput {
            beams: vec![
                BeamJudgment::new(3, 2),
                BeamJudgment::new(2, 1),
                BeamJudgment::new(3, 2),
                BeamJudgment::new(3, 2),
            ],
            synthesis: SynthesisJudgment::new(2, 2),
        };

        let judgment = JudgmentRecord::from_input(&record, &input);
        assert_eq!(judgment.beam_judgments[0], BeamJudgment::new(3, 2));
        assert_eq!(judgment.beam_judgments[1], BeamJudgment::new(2, 1));
        assert_eq!(judgment.beam_judgments[2], BeamJudgment::HIDDEN);
        assert_eq!(judgment.beam_judgments[3], BeamJudgment::HIDDEN);
    }

    #[test]
    fn visible_beams_without_input_take_default_choice() {
        let record = record_with_beams(3);
        let judgment = JudgmentRecord::from_input(&record, &JudgmentInput::default());

        assert_eq!(judgment.beam_judgments[0], BeamJudgment::new(1, 1));
        assert_eq!(judgment.beam_judgments[2], BeamJudgment::new(1, 1));
        assert_eq!(judgment.beam_judgments[3], BeamJudgment::HIDDEN);
        assert_eq!(judgment.synthesis_signal_flag, 1);
        assert_eq!(judgment.synthesis_baseline_flag, 1);
    }

    #[test]
    fn validate_rejects_out_of_range_flags_on_visible_beams_only() {
        let input = JudgmentInput {
            beams: vec![BeamJudgment::new(1, 1), BeamJudgment::new(4, 1)],
            synthesis: SynthesisJudgment::default(),
        };

        assert!(input.validate(1).is_ok());
        let err = input.validate(2).unwrap_err();
        assert!(err.to_string().contains("beam2 rfi"));
    }

    #[test]
    fn validate_rejects_zero_for_visible_categories() {
        let input = JudgmentInput {
            beams: Vec::new(),
            synthesis: SynthesisJudgment::new(1, 0),
        };

        assert!(matches!(
            input.validate(1),
            Err(ReviewError::InvalidJudgment(_))
        ));
    }
}
