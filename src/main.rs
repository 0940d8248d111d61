use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use chatprep::{
    CorpusConfig, InputSource, Pipeline, Profile, RunSummary, write_records_csv,
    write_sentences_csv, write_utterances_csv,
};

#[derive(Parser)]
#[command(name = "chatprep")]
#[command(author, version, about = "CHAT transcript preprocessing pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a directory of transcripts into a record table
    Parse {
        /// Directory of CHAT transcripts (.txt or .cha)
        #[arg(short, long)]
        input: PathBuf,

        /// Output record table (CSV)
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Filter, normalize and merge participant utterances
    Preprocess {
        /// Directory of transcripts, or a record table written by `parse`
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for normalized utterances (CSV)
        #[arg(short, long)]
        utterances: Option<PathBuf>,

        /// Output file for merged sentences (CSV)
        #[arg(short, long)]
        sentences: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Normalization preset; individual flags are applied on top
        #[arg(long, value_enum)]
        profile: Option<Profile>,

        /// Replace pause placeholders with <mask>
        #[arg(long)]
        mask_pauses: bool,

        /// Collapse stuttered words and word pairs
        #[arg(long)]
        remove_repetitions: bool,

        /// Delete <mask> tokens
        #[arg(long)]
        remove_masks: bool,

        /// Contraction lexicon (JSON object of word to expansion)
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Write a JSON run summary
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report tags and scenarios found in a transcript directory
    Analyze {
        /// Directory of CHAT transcripts
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            input,
            output,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            parse_corpus(input, output, config)
        }
        Commands::Preprocess {
            input,
            utterances,
            sentences,
            config,
            profile,
            mask_pauses,
            remove_repetitions,
            remove_masks,
            lexicon,
            summary,
            verbose,
        } => {
            setup_logging(verbose);
            let mut corpus_config = load_config(config)?;
            if let Some(profile) = profile {
                corpus_config.normalize = profile.normalize_config();
            }
            corpus_config.normalize.mask_pauses |= mask_pauses;
            corpus_config.normalize.remove_repetitions |= remove_repetitions;
            corpus_config.normalize.remove_masks |= remove_masks;
            if lexicon.is_some() {
                corpus_config.lexicon.path = lexicon;
            }
            preprocess_corpus(input, utterances, sentences, summary, corpus_config)
        }
        Commands::Analyze {
            input,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_corpus(input, config)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<PathBuf>) -> Result<CorpusConfig> {
    CorpusConfig::load(path.as_deref()).context("Failed to load configuration")
}

fn parse_corpus(input: PathBuf, output: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let pipeline = Pipeline::new(load_config(config)?)?;
    let batch = pipeline.parse_directory(&input)?;

    let written = write_records_csv(&output, &batch.records)?;
    info!(
        "Parsed {} files ({} failed) into {} records",
        batch.files_processed,
        batch.failures.len(),
        written
    );
    info!("Record table written to {:?}", output);
    Ok(())
}

fn preprocess_corpus(
    input: PathBuf,
    utterances_output: Option<PathBuf>,
    sentences_output: PathBuf,
    summary_output: Option<PathBuf>,
    config: CorpusConfig,
) -> Result<()> {
    info!("Normalization: {:?}", config.normalize);
    let pipeline = Pipeline::new(config)?;

    let batch = match InputSource::detect(&input) {
        InputSource::Directory(dir) => pipeline.run_directory(&dir)?,
        InputSource::RecordTable(path) => pipeline.run_record_table(&path)?,
    };

    info!(
        "Processed {} files: {} records, {} utterances, {} sentences",
        batch.files_processed,
        batch.records.len(),
        batch.utterances.len(),
        batch.sentences.len()
    );
    info!("Dropped: {:?}", batch.dropped);

    if let Some(path) = &utterances_output {
        write_utterances_csv(path, &batch.utterances)?;
        info!("Utterances written to {:?}", path);
    }

    write_sentences_csv(&sentences_output, &batch.sentences)?;
    info!("Sentences written to {:?}", sentences_output);

    if let Some(path) = &summary_output {
        let normalize = pipeline.config().normalize;
        let summary = RunSummary {
            generated_at: Utc::now(),
            files_processed: batch.files_processed,
            files_failed: batch.failures,
            records: batch.records.len(),
            utterances: batch.utterances.len(),
            sentences: batch.sentences.len(),
            dropped: batch.dropped,
            mask_pauses: normalize.mask_pauses,
            remove_repetitions: normalize.remove_repetitions,
            remove_masks: normalize.remove_masks,
        };
        summary.write_json(path)?;
        info!("Run summary written to {:?}", path);
    }

    Ok(())
}

fn analyze_corpus(input: PathBuf, config: Option<PathBuf>) -> Result<()> {
    info!("Analyzing transcripts in {:?}", input);
    let pipeline = Pipeline::new(load_config(config)?)?;
    let batch = pipeline.parse_directory(&input)?;
    let tags = &pipeline.config().tags;

    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut scenario_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &batch.records {
        *tag_counts.entry(record.line_information.as_str()).or_insert(0) += 1;
        if tags.is_participant(&record.line_information) {
            *scenario_counts.entry(record.scenario.as_str()).or_insert(0) += 1;
        }
    }

    println!("Corpus Analysis");
    println!("===============");
    println!("Files parsed: {}", batch.files_processed);
    println!("Files failed: {}", batch.failures.len());
    println!("Records: {}", batch.records.len());
    println!();

    println!("Tags");
    println!("----");
    for (tag, count) in &tag_counts {
        let kind = if tags.is_speaker(tag) {
            "speaker"
        } else if tags.is_recognized(tag) {
            "annotation"
        } else {
            "unrecognized"
        };
        println!("{}: {} groups ({})", tag, count, kind);
    }
    println!();

    println!("Participant groups per scenario");
    println!("-------------------------------");
    let allowed = &pipeline.config().filter.scenarios;
    for (scenario, count) in &scenario_counts {
        let marker = if allowed.iter().any(|s| s == *scenario) {
            "kept"
        } else {
            "excluded"
        };
        println!("{}: {} ({})", scenario, count, marker);
    }

    for failure in &batch.failures {
        println!("Failed: {:?}: {}", failure.path, failure.error);
    }

    Ok(())
}
