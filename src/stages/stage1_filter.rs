use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{SpeakerStatus, TagConfig, TranscriptRecord};

/// Configuration for Stage 1 filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Scenarios whose participant utterances are kept
    pub scenarios: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        // Intro segments, naming tests, repetition and the alternate sandwich
        // prompts are left out.
        Self {
            scenarios: [
                "Important_Event",
                "Speech",
                "Stroke",
                "Cinderella",
                "Sandwich",
                "Window",
                "Cat",
                "Umbrella",
                "Flood",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// A record with its derived speaker role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTaggedRecord {
    pub record: TranscriptRecord,
    pub speaker_status: SpeakerStatus,
}

/// Result of Stage 1 filtering
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Surviving participant records, in input order
    pub records: Vec<RoleTaggedRecord>,
    /// Records dropped for having no text
    pub empty_dropped: usize,
    /// Records dropped by role derivation
    pub role_dropped: usize,
    /// Records dropped by the scenario/tag restriction
    pub scope_dropped: usize,
}

/// Derive the carried-forward speaker role of every record
///
/// An investigator tag sets the role to investigator, the participant tag sets
/// it to participant, and every other record inherits the current role.
pub fn derive_speaker_status(records: &[TranscriptRecord], tags: &TagConfig) -> Vec<SpeakerStatus> {
    records
        .iter()
        .scan(SpeakerStatus::None, |status, record| {
            if tags.is_investigator(&record.line_information) {
                *status = SpeakerStatus::Investigator;
            } else if tags.is_participant(&record.line_information) {
                *status = SpeakerStatus::Participant;
            }
            Some(*status)
        })
        .collect()
}

/// Whether a record belongs to an allow-listed scenario and carries exactly
/// the participant tag
pub fn in_scope(record: &TranscriptRecord, config: &FilterConfig, tags: &TagConfig) -> bool {
    config.scenarios.iter().any(|s| *s == record.scenario)
        && record.line_information == tags.participant_tag
}

/// Perform Stage 1: keep participant utterances of in-scope scenarios
///
/// Both the derived role and the scope restriction must pass. Records with
/// empty text are dropped before roles are derived.
pub fn filter_utterances(
    records: Vec<TranscriptRecord>,
    config: &FilterConfig,
    tags: &TagConfig,
) -> FilterResult {
    let total = records.len();
    let records: Vec<TranscriptRecord> = records
        .into_iter()
        .filter(|r| !r.text.trim().is_empty())
        .collect();
    let empty_dropped = total - records.len();

    let statuses = derive_speaker_status(&records, tags);

    let mut role_dropped = 0;
    let mut scope_dropped = 0;
    let mut kept = Vec::new();

    for (record, speaker_status) in records.into_iter().zip(statuses) {
        if speaker_status != SpeakerStatus::Participant {
            role_dropped += 1;
            continue;
        }
        if !in_scope(&record, config, tags) {
            scope_dropped += 1;
            continue;
        }
        kept.push(RoleTaggedRecord {
            record,
            speaker_status,
        });
    }

    debug!(
        "Stage 1: kept {} of {} records ({} empty, {} by role, {} by scope)",
        kept.len(),
        total,
        empty_dropped,
        role_dropped,
        scope_dropped
    );

    FilterResult {
        records: kept,
        empty_dropped,
        role_dropped,
        scope_dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, scenario: &str, tag: &str, text: &str) -> TranscriptRecord {
        TranscriptRecord {
            line_group_id: id,
            scenario: scenario.to_string(),
            text: text.to_string(),
            line_information: tag.to_string(),
            utterance_count: id,
            source_file: "a.txt".to_string(),
        }
    }

    #[test]
    fn test_derive_speaker_status() {
        let records = vec![
            record(1, "Speech", "%exp", "note"),
            record(2, "Speech", "*INV", "question ?"),
            record(3, "Speech", "%mor", "pro|it"),
            record(4, "Speech", "*PAR", "answer ."),
            record(5, "Speech", "%gra", "1|2|SUBJ"),
            record(6, "Speech", "*IN1", "next ."),
        ];
        let statuses = derive_speaker_status(&records, &TagConfig::default());

        assert_eq!(
            statuses,
            vec![
                SpeakerStatus::None,
                SpeakerStatus::Investigator,
                SpeakerStatus::Investigator,
                SpeakerStatus::Participant,
                SpeakerStatus::Participant,
                SpeakerStatus::Investigator,
            ]
        );
    }

    #[test]
    fn test_filter_keeps_only_participant_lines() {
        let records = vec![
            record(1, "Speech", "*INV", "question ?"),
            record(2, "Speech", "*PAR", "answer ."),
            record(3, "Speech", "%mor", "n|answer ."),
            record(4, "Speech", "*PAR", "more ."),
        ];
        let result = filter_utterances(records, &FilterConfig::default(), &TagConfig::default());
        let ids: Vec<u64> = result.records.iter().map(|r| r.record.line_group_id).collect();

        assert_eq!(ids, vec![2, 4]);
        assert_eq!(result.role_dropped, 1);
        // the %mor tier passes role derivation but not the tag restriction
        assert_eq!(result.scope_dropped, 1);
        assert!(result
            .records
            .iter()
            .all(|r| r.speaker_status == SpeakerStatus::Participant));
    }

    #[test]
    fn test_scenario_outside_allow_list_is_excluded() {
        let config = FilterConfig {
            scenarios: vec!["Cinderella".to_string()],
        };
        let records = vec![
            record(1, "BNT", "*PAR", "a tree ."),
            record(2, "Cinderella", "*PAR", "the slipper ."),
        ];
        let result = filter_utterances(records, &config, &TagConfig::default());

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].record.scenario, "Cinderella");
        assert_eq!(result.scope_dropped, 1);
    }

    #[test]
    fn test_empty_text_dropped_first() {
        let records = vec![
            record(1, "Speech", "*PAR", ""),
            record(2, "Speech", "*PAR", "  "),
            record(3, "Speech", "*PAR", "hello ."),
        ];
        let result = filter_utterances(records, &FilterConfig::default(), &TagConfig::default());

        assert_eq!(result.empty_dropped, 2);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_default_scenarios() {
        let config = FilterConfig::default();
        assert!(config.scenarios.contains(&"Cinderella".to_string()));
        assert!(!config.scenarios.contains(&"BNT".to_string()));
        assert_eq!(config.scenarios.len(), 9);
    }
}
