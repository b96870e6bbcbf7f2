use tracing::{info, warn};

use crate::error::ReviewError;
use crate::model::{CatalogRecord, JudgmentInput, JudgmentRecord};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Done,
}

pub struct ReviewSession {
    store: Store,
    current: Option<CatalogRecord>,
}

impl ReviewSession {
    pub fn start(store: Store) -> Result<Self, ReviewError> {
        let current = store.fetch_one()?;
        match &current {
            Some(record) => info!(galaxy = %record.name, "review session started"),
            None => report_leftovers(&store, "catalog is empty, nothing to review")?,
        }
        Ok(Self { store, current })
    }

    pub fn state(&self) -> SessionState {
        if self.current.is_some() {
            SessionState::AwaitingInput
        } else {
            SessionState::Done
        }
    }

    pub fn current(&self) -> Option<&CatalogRecord> {
        self.current.as_ref()
    }

    pub fn visible_beam_count(&self) -> usize {
        self.current
            .as_ref()
            .map(CatalogRecord::visible_beam_count)
            .unwrap_or(0)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Saves `input` for the current record, removes that record from the
    /// catalog and checks out the next one.
    ///
    /// Validation and write failures leave the current record in place. A
    /// failure while fetching the next record is returned after the
    /// judgment has been committed; the session then holds no record.
    pub fn submit(&mut self, input: &JudgmentInput) -> Result<SessionState, ReviewError> {
        let record = self.current.as_ref().ok_or(ReviewError::NoCurrentRecord)?;
        input.validate(record.visible_beam_count())?;

        let judgment = JudgmentRecord::from_input(record, input);
        self.store.commit_judgment(&judgment)?;
        info!(
            galaxy = %judgment.galaxy_name,
            visible_beams = record.visible_beam_count(),
            "saved judgment"
        );

        self.current = None;
        self.current = self.store.fetch_one()?;

        match &self.current {
            Some(next) => info!(galaxy = %next.name, "checked out next record"),
            None => report_leftovers(&self.store, "catalog exhausted, review complete")?,
        }
        Ok(self.state())
    }

    pub fn skip(&mut self) -> SessionState {
        if let Some(record) = &self.current {
            warn!(galaxy = %record.name, "judgment discarded, record kept");
        }
        self.state()
    }
}

fn report_leftovers(store: &Store, message: &str) -> Result<(), ReviewError> {
    let unreadable = store.unreadable_count()?;
    if unreadable > 0 {
        warn!(unreadable, "{message}; unreadable catalog rows remain");
    } else {
        info!("{message}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BeamJudgment, MAX_BEAMS, SynthesisJudgment};

    fn record(name: &str, beams: usize) -> CatalogRecord {
        CatalogRecord {
            name: name.to_string(),
            beam_paths: (1..=beams).map(|i| format!("{name}_b{i}.fits")).collect(),
            synthesis_path: format!("{name}.fits"),
            aux_path: String::new(),
        }
    }

    fn session_with(records: &[CatalogRecord]) -> ReviewSession {
        let mut store = Store::open_in_memory().unwrap();
        store.insert_many(records).unwrap();
        ReviewSession::start(store).unwrap()
    }

    #[test]
    fn empty_catalog_starts_done() {
        let mut session = session_with(&[]);
        assert_eq!(session.state(), SessionState::Done);
        assert!(session.current().is_none());
        assert_eq!(session.visible_beam_count(), 0);
        assert!(matches!(
            session.submit(&JudgmentInput::default()),
            Err(ReviewError::NoCurrentRecord)
        ));
    }

    #[test]
    fn single_record_scenario_ends_done_with_hidden_beams_zeroed() {
        let mut session = session_with(&[record("AGC100", 2)]);
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.current().unwrap().name, "AGC100");
        assert_eq!(session.visible_beam_count(), 2);

        let input = JudgmentInput {
            beams: vec![BeamJudgment::new(1, 1), BeamJudgment::new(2, 2)],
            synthesis: SynthesisJudgment::new(1, 1),
        };
        assert_eq!(session.submit(&input).unwrap(), SessionState::Done);
        assert!(session.current().is_none());

        let results = session.store().list_results().unwrap();
        assert_eq!(results.len(), 1);
        let saved = &results[0];
        assert_eq!(saved.galaxy_name, "AGC100");
        assert_eq!(
            saved.beam_judgments,
            [
                BeamJudgment::new(1, 1),
                BeamJudgment::new(2, 2),
                BeamJudgment::HIDDEN,
                BeamJudgment::HIDDEN
            ]
        );
        assert_eq!(saved.synthesis_signal_flag, 1);
        assert_eq!(saved.synthesis_baseline_flag, 1);
        assert_eq!(session.store().pending_count().unwrap(), 0);
    }

    #[test]
    fn submit_never_returns_the_same_record_twice() {
        let mut session = session_with(&[record("AGC1", 1), record("AGC2", 4), record("AGC3", 3)]);
        let mut seen = Vec::new();

        while let Some(current) = session.current() {
            let name = current.name.clone();
            assert!(!seen.contains(&name));
            seen.push(name.clone());

            session.submit(&JudgmentInput::default()).unwrap();
            assert_ne!(session.current().map(|r| r.name.as_str()), Some(name.as_str()));
        }

        assert_eq!(seen, vec!["AGC1", "AGC2", "AGC3"]);
        assert_eq!(session.store().result_count().unwrap(), 3);
    }

    #[test]
    fn hidden_slots_are_zero_for_every_beam_count() {
        let records: Vec<_> = (1..=MAX_BEAMS)
            .map(|count| record(&format!("AGC{count}"), count))
            .collect();
        let mut session = session_with(&records);
        let everything = JudgmentInput {
            beams: vec![BeamJudgment::new(3, 2); MAX_BEAMS],
            synthesis: SynthesisJudgment::new(3, 2),
        };

        while session.current().is_some() {
            session.submit(&everything).unwrap();
        }

        for (index, result) in session.store().list_results().unwrap().iter().enumerate() {
            let visible = index + 1;
            for (slot, beam) in result.beam_judgments.iter().enumerate() {
                if slot < visible {
                    assert_eq!(*beam, BeamJudgment::new(3, 2));
                } else {
                    assert_eq!(*beam, BeamJudgment::HIDDEN);
                }
            }
        }
    }

    #[test]
    fn invalid_input_keeps_current_record() {
        let mut session = session_with(&[record("AGC1", 1)]);
        let input = JudgmentInput {
            beams: vec![BeamJudgment::new(0, 1)],
            synthesis: SynthesisJudgment::default(),
        };

        let err = session.submit(&input).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(session.current().unwrap().name, "AGC1");
        assert_eq!(session.store().result_count().unwrap(), 0);
    }

    #[test]
    fn skip_leaves_record_checked_out_and_writes_nothing() {
        let mut session = session_with(&[record("AGC1", 1), record("AGC2", 1)]);

        assert_eq!(session.skip(), SessionState::AwaitingInput);
        assert_eq!(session.current().unwrap().name, "AGC1");
        assert_eq!(session.store().result_count().unwrap(), 0);
        assert_eq!(session.store().pending_count().unwrap(), 2);
    }

    #[test]
    fn failed_commit_keeps_current_record_and_writes_nothing() {
        let mut session = session_with(&[record("AGC1", 1), record("AGC2", 1)]);
        session
            .store()
            .connection()
            .execute("DELETE FROM galaxies WHERE galaxy_name = 'AGC1'", [])
            .unwrap();

        let err = session.submit(&JudgmentInput::default()).unwrap_err();
        assert!(matches!(err, ReviewError::StorageQueryMessage(_)));
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.current().unwrap().name, "AGC1");
        assert_eq!(session.store().result_count().unwrap(), 0);
    }

    #[test]
    fn unreadable_row_does_not_block_later_records() {
        let mut store = Store::open_in_memory().unwrap();
        store.insert_many(&[record("AGC1", 1)]).unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO galaxies(galaxy_name, beam_file_path, synthesis_file_path, sdss_file_path)
                 VALUES('AGC2', 'garbage', 'AGC2.fits', '')",
                [],
            )
            .unwrap();
        store.insert_many(&[record("AGC3", 2)]).unwrap();
        let mut session = ReviewSession::start(store).unwrap();

        assert_eq!(session.current().unwrap().name, "AGC1");
        session.submit(&JudgmentInput::default()).unwrap();
        assert_eq!(session.current().unwrap().name, "AGC3");
        assert_eq!(session.submit(&JudgmentInput::default()).unwrap(), SessionState::Done);

        assert_eq!(session.store().result_count().unwrap(), 2);
        assert_eq!(session.store().pending_count().unwrap(), 1);
    }
}
