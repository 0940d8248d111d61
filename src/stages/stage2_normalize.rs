use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lexicon::ContractionLexicon;
use crate::models::Utterance;

use super::stage1_filter::RoleTaggedRecord;

/// Placeholder installed for trailing-off and timed pauses
pub const UNFILLED_PAUSE: &str = "UNFILLEDPAUSE";
/// Placeholder installed for filled pauses
pub const FILLER_PAUSE: &str = "FILLERPAUSE";
/// Token both placeholders collapse to when pauses are masked
pub const MASK_TOKEN: &str = "<mask>";

/// Trailing-off and pause markers
pub const UNFILLED_PAUSE_MARKERS: &[&str] = &["(..)", "(...)", "+..."];

/// Filled-pause and non-lexical disfluency codes
pub const FILLER_PAUSE_CODES: &[&str] = &[
    "&-um", "&-uh", "&-er", "&-mm", "&-eh", "&-like", "&-youknow", "&-hm", "&-sighs",
];

/// Stray transcription symbols removed verbatim, tried in this order at each
/// position
pub const LITERAL_ARTIFACTS: &[&str] = &[
    "(.)", "[/]", "[//]", "‡", "xxx", "+< ", "„", "+", "\"\" /..\"\"", "+\"/.", "+\"", "+/?",
    "+//.", "+//?", "[]", "<>", "_", "-", "^", ")", "(", ":", "www .", "*PAR", "+/", "@o", "<",
    ">", "//..", "//", "/..", "/", "\"", "ʌ", "..?", "0.", "0 .", "\"\" /.",
];

/// Characters trimmed from the start of an utterance
pub const LEADING_BOUNDARY: &[char] = &[' ', ',', '!', '.', '?'];

/// Configuration for Stage 2 normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Replace both pause placeholders with the mask token
    pub mask_pauses: bool,
    /// Collapse stuttered unigrams and bigrams
    pub remove_repetitions: bool,
    /// Delete mask tokens entirely
    pub remove_masks: bool,
}

fn alternation(literals: &[&str]) -> Regex {
    let pattern = literals
        .iter()
        .map(|l| regex::escape(l))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).expect("escaped literal alternation is a valid regex")
}

static UNFILLED_RE: Lazy<Regex> = Lazy::new(|| alternation(UNFILLED_PAUSE_MARKERS));
static FILLER_RE: Lazy<Regex> = Lazy::new(|| alternation(FILLER_PAUSE_CODES));
static LITERAL_RE: Lazy<Regex> = Lazy::new(|| alternation(LITERAL_ARTIFACTS));

// action annotations such as &=points:picture
static ACTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W\W\w+\W\w+").unwrap());
// media bullets and broken unicode escapes such as \u{15}123_456\u{15}
static ERROR_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W\d+\w\d+\W").unwrap());
// word codes such as &=laughs or @s:es
static WORD_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W\W\w+").unwrap());

static SQUARE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());
static ANGLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").unwrap());
static AMPERSAND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&+[a-zA-Z]+").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());
static TERMINAL_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +([.?!])").unwrap());

/// Stage 1: expand contractions token by token
pub fn expand_contractions(text: &str, lexicon: &ContractionLexicon) -> String {
    lexicon.expand_text(text)
}

/// Stage 2: mark trailing-off pauses
pub fn mark_unfilled_pauses(text: &str) -> String {
    UNFILLED_RE.replace_all(text, UNFILLED_PAUSE).into_owned()
}

/// Stage 3: mark filled pauses
pub fn mark_filler_pauses(text: &str) -> String {
    FILLER_RE.replace_all(text, FILLER_PAUSE).into_owned()
}

fn strip_compact_matches(re: &Regex, text: &str) -> String {
    re.replace_all(text, |caps: &Captures| {
        let matched = &caps[0];
        if matched.chars().any(char::is_whitespace) {
            matched.to_string()
        } else {
            String::new()
        }
    })
    .into_owned()
}

/// Stage 4: remove punctuation-prefixed codes
///
/// A match spanning whitespace is kept, so ordinary words following
/// punctuation (`") Cinderella"`) survive.
pub fn strip_structured_noise(text: &str) -> String {
    let text = strip_compact_matches(&ACTION_RE, text);
    let text = strip_compact_matches(&ERROR_CODE_RE, &text);
    strip_compact_matches(&WORD_CODE_RE, &text)
}

/// Stage 5: empty every `[...]` and `<...>` span, keeping the brackets
pub fn strip_brackets(text: &str) -> String {
    let text = SQUARE_RE.replace_all(text, "[]");
    ANGLE_RE.replace_all(&text, "<>").into_owned()
}

/// Stage 6: remove `&`-prefixed codes left after filler marking
pub fn strip_ampersand_tags(text: &str) -> String {
    AMPERSAND_RE.replace_all(text, "").into_owned()
}

/// Stage 7: remove stray transcription symbols
pub fn remove_literal_tokens(text: &str) -> String {
    LITERAL_RE.replace_all(text, "").into_owned()
}

/// Stages 8 and 12 share this: runs of spaces become one space
pub fn collapse_spaces(text: &str) -> String {
    SPACES_RE.replace_all(text, " ").into_owned()
}

/// Stage 9: trim the leading run of spaces, commas and terminal marks
pub fn trim_leading_boundary(text: &str) -> &str {
    text.trim_start_matches(LEADING_BOUNDARY)
}

/// Stage 10: resolve pause placeholders
pub fn resolve_placeholders(text: &str, config: &NormalizeConfig) -> String {
    let mut text = text.to_string();
    if config.mask_pauses {
        text = text
            .replace(UNFILLED_PAUSE, MASK_TOKEN)
            .replace(FILLER_PAUSE, MASK_TOKEN);
    }
    if config.remove_masks {
        text = text.replace(MASK_TOKEN, "");
    }
    text
}

/// Stage 11: collapse stuttering
///
/// Adjacent identical tokens collapse to one, then adjacent identical token
/// pairs collapse to one pair.
pub fn collapse_repetitions(text: &str) -> String {
    let mut unigrams: Vec<&str> = Vec::new();
    for token in text.split_whitespace() {
        if unigrams.last() != Some(&token) {
            unigrams.push(token);
        }
    }

    let mut collapsed: Vec<&str> = Vec::with_capacity(unigrams.len());
    for token in unigrams {
        collapsed.push(token);
        let n = collapsed.len();
        if n >= 4 && collapsed[n - 4..n - 2] == collapsed[n - 2..n] {
            collapsed.truncate(n - 2);
        }
    }

    collapsed.join(" ")
}

/// Stage 12: collapse spaces, attach terminal marks and trim the ends
pub fn finalize_whitespace(text: &str) -> String {
    let text = collapse_spaces(text);
    TERMINAL_SPACE_RE
        .replace_all(&text, "$1")
        .trim()
        .to_string()
}

/// Ordered normalization pipeline applied to each surviving utterance
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    lexicon: ContractionLexicon,
    config: NormalizeConfig,
}

impl TextNormalizer {
    pub fn new(lexicon: ContractionLexicon, config: NormalizeConfig) -> Self {
        Self { lexicon, config }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Run all twelve stages in order
    pub fn normalize(&self, text: &str) -> String {
        let text = expand_contractions(text, &self.lexicon);
        let text = mark_unfilled_pauses(&text);
        let text = mark_filler_pauses(&text);
        // needs the raw punctuation that stage 7 removes
        let text = strip_structured_noise(&text);
        let text = strip_brackets(&text);
        let text = strip_ampersand_tags(&text);
        let text = remove_literal_tokens(&text);
        let text = collapse_spaces(&text);
        let text = trim_leading_boundary(&text);
        let text = resolve_placeholders(text, &self.config);
        let text = if self.config.remove_repetitions {
            collapse_repetitions(&text)
        } else {
            text
        };
        finalize_whitespace(&text)
    }
}

/// Perform Stage 2: normalize the text of every filtered record
pub fn normalize_utterances(
    records: Vec<RoleTaggedRecord>,
    normalizer: &TextNormalizer,
) -> Vec<Utterance> {
    let utterances: Vec<Utterance> = records
        .into_iter()
        .map(|tagged| {
            let preprocessed_text = normalizer.normalize(&tagged.record.text);
            Utterance {
                original_text: tagged.record.text.clone(),
                preprocessed_text,
                speaker_status: tagged.speaker_status,
                record: tagged.record,
            }
        })
        .collect();

    debug!(
        "Stage 2: normalized {} utterances ({:?})",
        utterances.len(),
        normalizer.config()
    );

    utterances
}
