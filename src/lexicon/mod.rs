pub mod contractions;

pub use contractions::DEFAULT_CONTRACTIONS;

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse lexicon {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Word-to-expansion lookup used by the contraction stage of normalization
#[derive(Debug, Clone)]
pub struct ContractionLexicon {
    entries: HashMap<String, String>,
}

impl Default for ContractionLexicon {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_CONTRACTIONS.iter().copied())
    }
}

impl ContractionLexicon {
    /// An empty lexicon that leaves every token unchanged
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(word, expansion)| (lookup_key(word), expansion.to_string()))
            .collect();
        Self { entries }
    }

    /// Load a JSON object of `"word": "expansion"` pairs layered over the
    /// built-in table
    pub fn from_json_file(path: &Path) -> Result<Self, LexiconError> {
        let content = std::fs::read_to_string(path).map_err(|source| LexiconError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let extra: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|source| LexiconError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut lexicon = Self::default();
        debug!("Loaded {} lexicon entries from {:?}", extra.len(), path);
        lexicon.extend(extra);
        Ok(lexicon)
    }

    pub fn extend(&mut self, pairs: impl IntoIterator<Item = (String, String)>) {
        for (word, expansion) in pairs {
            self.entries.insert(lookup_key(&word), expansion);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the expansion of a bare word (no surrounding punctuation)
    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.entries.get(&lookup_key(word)).map(String::as_str)
    }

    /// Expand one whitespace-delimited token
    ///
    /// Punctuation around the word is kept and the expansion follows the
    /// word's capitalization. Tokens without an entry are returned as-is.
    pub fn expand_token<'a>(&self, token: &'a str) -> Cow<'a, str> {
        let core = token.trim_matches(|c: char| !is_word_char(c));
        if core.is_empty() {
            return Cow::Borrowed(token);
        }

        let Some(expansion) = self.lookup(core) else {
            return Cow::Borrowed(token);
        };

        let start = token.len() - token.trim_start_matches(|c: char| !is_word_char(c)).len();
        let end = start + core.len();
        let expansion = match_case(core, expansion);

        Cow::Owned(format!("{}{}{}", &token[..start], expansion, &token[end..]))
    }

    /// Expand every whitespace-delimited token and rejoin with single spaces
    pub fn expand_text(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.expand_token(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '\u{2019}'
}

fn lookup_key(word: &str) -> String {
    word.to_lowercase().replace('\u{2019}', "'")
}

fn match_case(word: &str, expansion: &str) -> String {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return expansion.to_uppercase();
    }

    let mut chars = expansion.chars();
    match (letters.first(), chars.next()) {
        (Some(first), Some(head)) if first.is_uppercase() => {
            head.to_uppercase().chain(chars).collect()
        }
        _ => expansion.to_string(),
    }
}
