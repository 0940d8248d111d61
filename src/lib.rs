pub mod config;
pub mod io;
pub mod lexicon;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use config::{ConfigError, CorpusConfig, LexiconConfig, Profile};
pub use io::{DropCounts, InputSource, RunSummary, write_records_csv, write_sentences_csv, write_utterances_csv};
pub use lexicon::ContractionLexicon;
pub use models::{Sentence, SpeakerStatus, TagConfig, TranscriptRecord, Utterance};
pub use pipeline::{BatchOutput, FileOutput, Pipeline};
pub use stages::{
    FilterConfig, MergeConfig, NormalizeConfig, TextNormalizer, filter_utterances,
    merge_sentences, normalize_utterances, parse_transcript, parse_transcript_str,
};
