use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Sentence, Utterance};

/// Marks that close a sentence
pub const SENTENCE_TERMINATORS: &[char] = &['.', '?', '!'];

/// Configuration for Stage 3 merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Emit the fragments left open at the end of a file as a final sentence
    pub keep_unterminated_tail: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            keep_unterminated_tail: true,
        }
    }
}

/// Result of Stage 3 merging for one file
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub sentences: Vec<Sentence>,
    /// Utterances skipped because normalization left no text
    pub empty_skipped: usize,
    /// Fragments dropped from an unterminated tail
    pub tail_dropped: usize,
}

/// Whether normalized text closes a sentence
pub fn is_terminated(text: &str) -> bool {
    text.contains(SENTENCE_TERMINATORS)
}

fn close_group(group: &[&Utterance]) -> Option<Sentence> {
    let first = group.first()?;
    Some(Sentence {
        scenario: first.scenario().to_string(),
        source_file: first.source_file().to_string(),
        original_text: group.iter().map(|u| u.original_text.as_str()).collect(),
        preprocessed_text: group.iter().map(|u| u.preprocessed_text.as_str()).collect(),
        fragment_count: group.len(),
    })
}

/// Perform Stage 3: merge fragments into sentences
///
/// Every utterance joins the open group; an utterance containing a
/// terminator closes it. Texts are concatenated without a separator and the
/// scenario and source file come from the group's first utterance. Single
/// utterance groups become sentences on their own.
pub fn merge_sentences(utterances: &[Utterance], config: &MergeConfig) -> MergeResult {
    let mut sentences = Vec::new();
    let mut group: Vec<&Utterance> = Vec::new();
    let mut empty_skipped = 0;

    for utterance in utterances {
        if utterance.preprocessed_text.is_empty() {
            empty_skipped += 1;
            continue;
        }

        group.push(utterance);
        if is_terminated(&utterance.preprocessed_text) {
            sentences.extend(close_group(&group));
            group.clear();
        }
    }

    let mut tail_dropped = 0;
    if config.keep_unterminated_tail {
        sentences.extend(close_group(&group));
    } else {
        tail_dropped = group.len();
    }

    debug!(
        "Stage 3: merged {} utterances into {} sentences",
        utterances.len() - empty_skipped,
        sentences.len()
    );

    MergeResult {
        sentences,
        empty_skipped,
        tail_dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SpeakerStatus, TranscriptRecord};

    fn utterance(id: u64, scenario: &str, original: &str, preprocessed: &str) -> Utterance {
        Utterance {
            record: TranscriptRecord {
                line_group_id: id,
                scenario: scenario.to_string(),
                text: original.to_string(),
                line_information: "*PAR".to_string(),
                utterance_count: id,
                source_file: "a.txt".to_string(),
            },
            speaker_status: SpeakerStatus::Participant,
            original_text: original.to_string(),
            preprocessed_text: preprocessed.to_string(),
        }
    }

    #[test]
    fn test_fragments_concatenate_without_separator() {
        let utterances = vec![
            utterance(1, "Cat", "I went", "I went"),
            utterance(2, "Cat", "to the store.", "to the store."),
        ];
        let result = merge_sentences(&utterances, &MergeConfig::default());

        assert_eq!(result.sentences.len(), 1);
        assert_eq!(result.sentences[0].original_text, "I wentto the store.");
        assert_eq!(result.sentences[0].preprocessed_text, "I wentto the store.");
        assert_eq!(result.sentences[0].fragment_count, 2);
    }

    #[test]
    fn test_singletons_are_promoted() {
        let utterances = vec![
            utterance(1, "Cat", "yes .", "yes."),
            utterance(2, "Cat", "what ?", "what?"),
        ];
        let result = merge_sentences(&utterances, &MergeConfig::default());

        assert_eq!(result.sentences.len(), 2);
        assert!(result.sentences.iter().all(|s| s.fragment_count == 1));
    }

    #[test]
    fn test_scenario_from_first_fragment() {
        let utterances = vec![
            utterance(1, "Window", "and then", "and then"),
            utterance(2, "Umbrella", "it rained .", "it rained."),
        ];
        let result = merge_sentences(&utterances, &MergeConfig::default());

        assert_eq!(result.sentences[0].scenario, "Window");
        assert_eq!(result.sentences[0].source_file, "a.txt");
    }

    #[test]
    fn test_unterminated_tail() {
        let utterances = vec![
            utterance(1, "Cat", "done .", "done."),
            utterance(2, "Cat", "and the", "and the"),
        ];

        let kept = merge_sentences(&utterances, &MergeConfig::default());
        assert_eq!(kept.sentences.len(), 2);
        assert_eq!(kept.sentences[1].preprocessed_text, "and the");

        let config = MergeConfig {
            keep_unterminated_tail: false,
        };
        let dropped = merge_sentences(&utterances, &config);
        assert_eq!(dropped.sentences.len(), 1);
        assert_eq!(dropped.tail_dropped, 1);
    }

    #[test]
    fn test_empty_normalized_text_skipped() {
        let utterances = vec![
            utterance(1, "Cat", "&=laughs", ""),
            utterance(2, "Cat", "the cat .", "the cat."),
        ];
        let result = merge_sentences(&utterances, &MergeConfig::default());

        assert_eq!(result.empty_skipped, 1);
        assert_eq!(result.sentences.len(), 1);
        assert_eq!(result.sentences[0].original_text, "the cat .");
    }

    #[test]
    fn test_is_terminated() {
        assert!(is_terminated("what?"));
        assert!(is_terminated("a. b"));
        assert!(!is_terminated("and then"));
    }
}
