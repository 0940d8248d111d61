use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Sentence, TranscriptRecord, Utterance};

/// Stage-1 output row: one per surviving utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtteranceRow<'a> {
    pub scenario: &'a str,
    pub source_file: &'a str,
    pub original_text: &'a str,
    pub preprocessed_text: &'a str,
}

impl<'a> From<&'a Utterance> for UtteranceRow<'a> {
    fn from(utterance: &'a Utterance) -> Self {
        Self {
            scenario: utterance.scenario(),
            source_file: utterance.source_file(),
            original_text: &utterance.original_text,
            preprocessed_text: &utterance.preprocessed_text,
        }
    }
}

/// Write rows as a CSV table with a header line
pub fn write_csv<T, I>(path: &Path, rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;

    let mut written = 0;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {:?}", path))?;
        written += 1;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {:?}", path))?;
    Ok(written)
}

pub fn write_records_csv(path: &Path, records: &[TranscriptRecord]) -> Result<usize> {
    write_csv(path, records)
}

pub fn write_utterances_csv(path: &Path, utterances: &[Utterance]) -> Result<usize> {
    write_csv(path, utterances.iter().map(UtteranceRow::from))
}

pub fn write_sentences_csv(path: &Path, sentences: &[Sentence]) -> Result<usize> {
    write_csv(path, sentences)
}

/// A file the batch could not process
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Rows removed by filtering and merging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    /// Records with no text
    pub empty_dropped: usize,
    /// Records outside the participant role
    pub role_dropped: usize,
    /// Participant-role records outside the scenario/tag restriction
    pub scope_dropped: usize,
    /// Utterances whose normalized text was empty
    pub empty_skipped: usize,
    /// Fragments of unterminated tails that were not emitted
    pub tail_dropped: usize,
}

impl AddAssign for DropCounts {
    fn add_assign(&mut self, other: Self) {
        self.empty_dropped += other.empty_dropped;
        self.role_dropped += other.role_dropped;
        self.scope_dropped += other.scope_dropped;
        self.empty_skipped += other.empty_skipped;
        self.tail_dropped += other.tail_dropped;
    }
}

/// Counts and settings of one preprocessing run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub files_processed: usize,
    pub files_failed: Vec<FileFailure>,
    pub records: usize,
    pub utterances: usize,
    pub sentences: usize,
    pub dropped: DropCounts,
    pub mask_pauses: bool,
    pub remove_repetitions: bool,
    pub remove_masks: bool,
}

impl RunSummary {
    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpeakerStatus;

    fn sample_utterance() -> Utterance {
        Utterance {
            record: TranscriptRecord {
                line_group_id: 4,
                scenario: "Flood".to_string(),
                text: "the water , it's rising .".to_string(),
                line_information: "*PAR".to_string(),
                utterance_count: 2,
                source_file: "p01.txt".to_string(),
            },
            speaker_status: SpeakerStatus::Participant,
            original_text: "the water , it's rising .".to_string(),
            preprocessed_text: "the water , it is rising.".to_string(),
        }
    }

    #[test]
    fn test_write_utterances_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utterances.csv");

        let written = write_utterances_csv(&path, &[sample_utterance()]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert_eq!(written, 1);
        assert_eq!(
            content,
            "scenario,source_file,original_text,preprocessed_text\n\
             Flood,p01.txt,\"the water , it's rising .\",\"the water , it is rising.\"\n"
        );
    }

    #[test]
    fn test_write_sentences_csv_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentences.csv");
        let sentence = Sentence {
            scenario: "Cat".to_string(),
            source_file: "p01.txt".to_string(),
            original_text: "up there .".to_string(),
            preprocessed_text: "up there.".to_string(),
            fragment_count: 1,
        };

        write_sentences_csv(&path, &[sentence]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("scenario,source_file,original_text,preprocessed_text\n"));
    }

    #[test]
    fn test_drop_counts_accumulate() {
        let mut total = DropCounts::default();
        total += DropCounts {
            role_dropped: 3,
            tail_dropped: 1,
            ..Default::default()
        };
        total += DropCounts {
            role_dropped: 2,
            empty_skipped: 4,
            ..Default::default()
        };

        assert_eq!(total.role_dropped, 5);
        assert_eq!(total.empty_skipped, 4);
        assert_eq!(total.tail_dropped, 1);
        assert_eq!(total.scope_dropped, 0);
    }

    #[test]
    fn test_records_round_trip_through_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        let record = sample_utterance().record;

        write_records_csv(&path, std::slice::from_ref(&record)).unwrap();
        let read = crate::io::read_records_csv(&path).unwrap();
        assert_eq!(read, vec![record]);
    }
}
