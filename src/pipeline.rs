use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, CorpusConfig};
use crate::io::{
    DropCounts, FileFailure, discover_transcripts, read_records_csv, read_transcript,
    source_file_id,
};
use crate::models::{Sentence, TranscriptRecord, Utterance};
use crate::stages::{
    TextNormalizer, filter_utterances, merge_sentences, normalize_utterances, parse_transcript_str,
};

/// Everything produced from one transcript file
#[derive(Debug, Clone, Default)]
pub struct FileOutput {
    pub records: Vec<TranscriptRecord>,
    pub utterances: Vec<Utterance>,
    pub sentences: Vec<Sentence>,
    pub dropped: DropCounts,
}

/// Union of per-file outputs, each file's rows kept in file order
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub records: Vec<TranscriptRecord>,
    pub utterances: Vec<Utterance>,
    pub sentences: Vec<Sentence>,
    pub dropped: DropCounts,
    pub files_processed: usize,
    pub failures: Vec<FileFailure>,
}

impl BatchOutput {
    fn from_files(outputs: Vec<FileOutput>, failures: Vec<FileFailure>) -> Self {
        let mut batch = BatchOutput {
            files_processed: outputs.len(),
            failures,
            ..Default::default()
        };
        for output in outputs {
            batch.records.extend(output.records);
            batch.utterances.extend(output.utterances);
            batch.sentences.extend(output.sentences);
            batch.dropped += output.dropped;
        }
        batch
    }
}

/// The four stages wired together for one configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CorpusConfig,
    normalizer: TextNormalizer,
}

impl Pipeline {
    pub fn new(config: CorpusConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let lexicon = config.build_lexicon()?;
        let normalizer = TextNormalizer::new(lexicon, config.normalize);
        Ok(Self { config, normalizer })
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Stages 1 to 3 over the records of a single file
    pub fn process_records(&self, source_file: &str, records: Vec<TranscriptRecord>) -> FileOutput {
        let filtered = filter_utterances(records.clone(), &self.config.filter, &self.config.tags);
        let utterances = normalize_utterances(filtered.records, &self.normalizer);
        let merged = merge_sentences(&utterances, &self.config.merge);

        let dropped = DropCounts {
            empty_dropped: filtered.empty_dropped,
            role_dropped: filtered.role_dropped,
            scope_dropped: filtered.scope_dropped,
            empty_skipped: merged.empty_skipped,
            tail_dropped: merged.tail_dropped,
        };
        debug!(
            "{}: {} records -> {} utterances -> {} sentences ({:?})",
            source_file,
            records.len(),
            utterances.len(),
            merged.sentences.len(),
            dropped
        );

        FileOutput {
            records,
            utterances,
            sentences: merged.sentences,
            dropped,
        }
    }

    /// All four stages over the text of one transcript file
    pub fn process_transcript(&self, content: &str, source_file: &str) -> FileOutput {
        let parsed = parse_transcript_str(content, source_file, &self.config.tags);
        self.process_records(source_file, parsed.records)
    }

    pub fn process_file(&self, path: &Path) -> Result<FileOutput> {
        let content = read_transcript(path)?;
        Ok(self.process_transcript(&content, &source_file_id(path)))
    }

    /// Stage 0 only, for every transcript under `dir`
    pub fn parse_directory(&self, dir: &Path) -> Result<BatchOutput> {
        let paths = discover_transcripts(dir)?;
        info!("Parsing {} transcript files from {:?}", paths.len(), dir);

        let (outputs, failures) = run_files(&paths, |path| {
            let content = read_transcript(path)?;
            let parsed = parse_transcript_str(&content, &source_file_id(path), &self.config.tags);
            Ok(FileOutput {
                records: parsed.records,
                ..Default::default()
            })
        });

        Ok(BatchOutput::from_files(outputs, failures))
    }

    /// Run the full pipeline over every transcript under `dir`
    ///
    /// Files are processed in parallel. A file that cannot be read is
    /// reported and skipped; the rest of the batch continues.
    pub fn run_directory(&self, dir: &Path) -> Result<BatchOutput> {
        let paths = discover_transcripts(dir)?;
        info!("Processing {} transcript files from {:?}", paths.len(), dir);

        let (outputs, failures) = run_files(&paths, |path| self.process_file(path));
        Ok(BatchOutput::from_files(outputs, failures))
    }

    /// Run stages 1 to 3 over a record table written by the `parse` command
    pub fn run_record_table(&self, path: &Path) -> Result<BatchOutput> {
        let records = read_records_csv(path)?;
        info!("Loaded {} records from {:?}", records.len(), path);

        let outputs: Vec<FileOutput> = split_by_source_file(records)
            .into_par_iter()
            .map(|(source_file, records)| self.process_records(&source_file, records))
            .collect();

        Ok(BatchOutput::from_files(outputs, Vec::new()))
    }
}

/// Apply `process` to every path in parallel, keeping input order and
/// collecting failures instead of aborting
fn run_files<T, F>(paths: &[PathBuf], process: F) -> (Vec<T>, Vec<FileFailure>)
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync,
{
    let results: Vec<(&PathBuf, Result<T>)> = paths
        .par_iter()
        .map(|path| (path, process(path.as_path())))
        .collect();

    let mut outputs = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (path, result) in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(err) => {
                warn!("Skipping {:?}: {:#}", path, err);
                failures.push(FileFailure {
                    path: path.clone(),
                    error: format!("{:#}", err),
                });
            }
        }
    }
    (outputs, failures)
}

/// Split a record table into contiguous per-file runs
fn split_by_source_file(records: Vec<TranscriptRecord>) -> Vec<(String, Vec<TranscriptRecord>)> {
    let mut files: Vec<(String, Vec<TranscriptRecord>)> = Vec::new();
    for record in records {
        match files.last_mut() {
            Some((source_file, group)) if *source_file == record.source_file => group.push(record),
            _ => files.push((record.source_file.clone(), vec![record])),
        }
    }
    files
}
