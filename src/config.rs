//! Run configuration: built-in defaults, an optional TOML file, then CLI
//! overrides applied by the binary.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lexicon::{ContractionLexicon, LexiconError};
use crate::models::TagConfig;
use crate::stages::{FilterConfig, MergeConfig, NormalizeConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid tag {tag:?}: tags must be exactly 4 characters")]
    TagWidth { tag: String },
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
}

/// Where contraction expansions come from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// JSON file of extra `"word": "expansion"` pairs
    pub path: Option<PathBuf>,
    /// Skip contraction expansion entirely
    pub disabled: bool,
}

/// Complete configuration of a preprocessing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub tags: TagConfig,
    pub filter: FilterConfig,
    pub normalize: NormalizeConfig,
    pub merge: MergeConfig,
    pub lexicon: LexiconConfig,
}

impl CorpusConfig {
    /// Parse a TOML document; missing sections keep their defaults
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Load `path` if given, otherwise the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Every tag must be exactly as wide as the tag field it is compared with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tags = &self.tags;
        let all = std::iter::once(&tags.participant_tag)
            .chain(&tags.investigator_tags)
            .chain(&tags.annotation_tags);

        for tag in all {
            if tag.chars().count() != crate::models::TAG_WIDTH {
                return Err(ConfigError::TagWidth { tag: tag.clone() });
            }
        }
        Ok(())
    }

    pub fn build_lexicon(&self) -> Result<ContractionLexicon, ConfigError> {
        if self.lexicon.disabled {
            return Ok(ContractionLexicon::empty());
        }
        match &self.lexicon.path {
            Some(path) => Ok(ContractionLexicon::from_json_file(path)?),
            None => Ok(ContractionLexicon::default()),
        }
    }
}

/// Normalization presets for the two speaker groups of a study
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Impaired speech: pauses masked, stuttering collapsed
    Impaired,
    /// Healthy speech: pauses removed
    Healthy,
    /// Pause placeholders left in the text
    Raw,
}

impl Profile {
    pub fn normalize_config(self) -> NormalizeConfig {
        match self {
            Profile::Impaired => NormalizeConfig {
                mask_pauses: true,
                remove_repetitions: true,
                remove_masks: false,
            },
            Profile::Healthy => NormalizeConfig {
                mask_pauses: true,
                remove_repetitions: false,
                remove_masks: true,
            },
            Profile::Raw => NormalizeConfig::default(),
        }
    }
}
