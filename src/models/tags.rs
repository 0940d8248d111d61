use serde::{Deserialize, Serialize};

/// Width of a transcript tag such as `*PAR` or `%mor`
pub const TAG_WIDTH: usize = 4;

/// Width of the tag field stripped from group text (`*PAR:` plus separator)
pub const TAG_FIELD_WIDTH: usize = 6;

/// Recognized transcript tags and metadata markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Prefix of a line that opens a new scenario
    pub scenario_prefix: String,
    /// Tag of the participant (the speaker whose utterances are kept)
    pub participant_tag: String,
    /// Investigator tag variants
    pub investigator_tags: Vec<String>,
    /// Annotation tiers; they delimit groups but are not utterances
    pub annotation_tags: Vec<String>,
    /// Group tags dropped from the parsed records
    pub discarded_markers: Vec<String>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            scenario_prefix: "@G:".to_string(),
            participant_tag: "*PAR".to_string(),
            investigator_tags: vec!["*INV".to_string(), "*IN1".to_string(), "*IN2".to_string()],
            annotation_tags: vec![
                "%wor".to_string(),
                "%mor".to_string(),
                "%gra".to_string(),
                "%exp".to_string(),
            ],
            discarded_markers: vec!["@Beg".to_string(), "@G: ".to_string(), "@UTF".to_string()],
        }
    }
}

impl TagConfig {
    /// Whether `tag` opens or continues a line-group
    pub fn is_recognized(&self, tag: &str) -> bool {
        self.is_speaker(tag) || self.annotation_tags.iter().any(|t| t == tag)
    }

    /// Participant or investigator tag
    pub fn is_speaker(&self, tag: &str) -> bool {
        tag == self.participant_tag || self.is_investigator(tag)
    }

    pub fn is_investigator(&self, tag: &str) -> bool {
        self.investigator_tags.iter().any(|t| t == tag)
    }

    pub fn is_participant(&self, tag: &str) -> bool {
        tag == self.participant_tag
    }

    pub fn is_discarded(&self, tag: &str) -> bool {
        self.discarded_markers.iter().any(|t| t == tag)
    }
}

/// Leading tag of a line, or `None` when the line is too short to carry one
pub fn leading_tag(line: &str) -> Option<&str> {
    line.char_indices()
        .nth(TAG_WIDTH)
        .map(|(end, _)| &line[..end])
        .or_else(|| (line.chars().count() == TAG_WIDTH).then_some(line))
}

/// Drop the first `count` characters of `text`
pub fn skip_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((start, _)) => &text[start..],
        None => "",
    }
}
