use serde::{Deserialize, Serialize};

/// One collapsed line-group of a transcript file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Group index within the file, advanced on every change of recognized tag
    #[serde(rename = "line_number")]
    pub line_group_id: u64,
    /// Scenario marker in effect when the group started
    pub scenario: String,
    /// Group text with the leading tag field removed
    pub text: String,
    /// Four-character tag, e.g. `*PAR` or `%mor`
    pub line_information: String,
    /// Running count of speaker-tagged groups up to and including this one
    pub utterance_count: u64,
    /// File the group was read from
    pub source_file: String,
}

/// Derived speaker role carried forward across records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SpeakerStatus {
    /// No speaker tag seen yet
    #[default]
    None,
    Investigator,
    Participant,
}

impl From<SpeakerStatus> for u8 {
    fn from(status: SpeakerStatus) -> Self {
        match status {
            SpeakerStatus::None => 0,
            SpeakerStatus::Investigator => 1,
            SpeakerStatus::Participant => 2,
        }
    }
}

impl TryFrom<u8> for SpeakerStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SpeakerStatus::None),
            1 => Ok(SpeakerStatus::Investigator),
            2 => Ok(SpeakerStatus::Participant),
            other => Err(format!("invalid speaker status: {}", other)),
        }
    }
}

/// A participant record that survived filtering, with its normalized text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub record: TranscriptRecord,
    pub speaker_status: SpeakerStatus,
    /// Text as transcribed
    pub original_text: String,
    /// Text after the normalization pipeline
    pub preprocessed_text: String,
}

impl Utterance {
    pub fn scenario(&self) -> &str {
        &self.record.scenario
    }

    pub fn source_file(&self) -> &str {
        &self.record.source_file
    }
}

/// One or more consecutive utterances merged into a complete sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub scenario: String,
    pub source_file: String,
    pub original_text: String,
    pub preprocessed_text: String,
    /// Number of utterances merged into this sentence
    #[serde(skip)]
    pub fragment_count: usize,
}
