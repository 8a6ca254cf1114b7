#![forbid(unsafe_code)]
//! # hanzi_insight CLI
//!
//! Command-line front end of the `hanzi_insight` crate. It loads each text
//! file as a document and runs one analysis on it: segmentation, word
//! frequency, part-of-speech tagging, entity extraction, visualization data
//! or a custom dictionary.
//!
//! ## Example
//! ```bash
//! cargo run --release -- 三国演义.txt frequency --top 30
//! cargo run --release -- 三国演义.txt --vocab weapon=weapon_dict.txt extract
//! cargo run --release -- corpus/ visualize bar --limit 15
//! ```
//!
//! See `--help` for all available options.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};

use hanzi_insight::viz::{self, ChartText};
use hanzi_insight::{
    AnalysisError, Dispatcher, Document, EntityCategory, EntityTable, JiebaTagger, Outcome, Pipeline,
    PipelineConfig, PreTaggedTagger, Request, Result, Tagger, VocabularySource, collect_files,
    ensure_dir, sink, vocabulary,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Text file or directory of .txt files to analyze
    path: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for entity tables and visualization data
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Segmentation/tagging backend
    #[arg(long, value_enum, default_value = "jieba")]
    tagger: TaggerKind,

    /// Custom entity vocabulary as NAME=PATH (repeatable), e.g. weapon=weapon_dict.txt
    #[arg(long = "vocab")]
    vocabularies: Vec<String>,

    /// Do not write entity tables automatically after extraction
    #[arg(long, default_value_t = false)]
    no_persist: bool,

    /// Also save the printed result to a timestamped report in this directory
    #[arg(long)]
    save_report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum TaggerKind {
    /// jieba dictionary + HMM
    Jieba,
    /// Input is already annotated as word/tag tokens
    Pretagged,
}

#[derive(Subcommand)]
enum Command {
    /// Split the text into words
    Segment {
        /// Number of words to print
        #[arg(long, default_value_t = 100)]
        show: usize,
    },
    /// Count word frequencies
    Frequency {
        /// Number of words to list (0 = all)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Tag parts of speech
    Pos {
        /// Number of tagged words to print
        #[arg(long, default_value_t = 100)]
        show: usize,
        /// Write all word<TAB>tag pairs to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Extract entities: person, location or a vocabulary name (default: all)
    Extract {
        categories: Vec<String>,
        /// Number of entries to print per category
        #[arg(long, default_value_t = 30)]
        show: usize,
    },
    /// Write renderer input data as JSON
    Visualize {
        #[arg(value_enum)]
        kind: VizKind,
        /// Number of bars
        #[arg(long)]
        limit: Option<usize>,
        /// Relationship file: source<TAB>target<TAB>weight per line
        #[arg(long)]
        relationships: Option<PathBuf>,
    },
    /// Build a custom dictionary (term freq n) from the most frequent words
    Dict {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 100)]
        top: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum VizKind {
    Bar,
    Wordcloud,
    Relationship,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = ensure_dir(&config.output_dir) {
        error!("Error: {}", e);
        process::exit(1);
    }

    let tagger: Arc<dyn Tagger> = match cli.tagger {
        TaggerKind::Jieba => Arc::new(JiebaTagger::new(config.hmm)),
        TaggerKind::Pretagged => Arc::new(PreTaggedTagger),
    };
    let dispatcher = Dispatcher::new(Arc::new(Pipeline::new(tagger, config)));

    if !cli.path.exists() {
        error!("Error: {} does not exist", cli.path.display());
        process::exit(1);
    }
    let files = collect_files(&cli.path);
    if files.is_empty() {
        error!("Error: no .txt files found in {}", cli.path.display());
        process::exit(1);
    }

    let mut any_errors = false;
    for file in files {
        match analyze_file(&dispatcher, &cli, &file) {
            Ok(report) => {
                println!("{}", report);
                if let Some(dir) = &cli.save_report {
                    let stem = file
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "text".to_string());
                    match sink::save_report(&report, dir, &stem, cli.command.stage()) {
                        Ok(path) => info!("Report saved to {}", path.display()),
                        Err(e) => {
                            error!("Error: {}", e);
                            any_errors = true;
                        }
                    }
                }
            }
            Err(e) => {
                error!("Error analyzing {}: {}", file.display(), e);
                any_errors = true;
            }
        }
    }
    if any_errors {
        process::exit(1);
    }
}

impl Command {
    fn stage(&self) -> &'static str {
        match self {
            Command::Segment { .. } => "segment",
            Command::Frequency { .. } => "frequency",
            Command::Pos { .. } => "pos",
            Command::Extract { .. } => "entities",
            Command::Visualize { .. } => "visualize",
            Command::Dict { .. } => "dict",
        }
    }
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    for value in &cli.vocabularies {
        config.set_vocabulary(VocabularySource::parse(value)?);
    }
    if cli.no_persist {
        config.persist_entities = false;
    }
    Ok(config)
}

/// Wait for the outcome of `request` on the current document.
fn request(dispatcher: &Dispatcher, request: Request) -> Result<Outcome> {
    match dispatcher.run_blocking(request) {
        Some(completion) => completion.result,
        None => Err(AnalysisError::MissingDocument),
    }
}

fn analyze_file(dispatcher: &Dispatcher, cli: &Cli, file: &Path) -> Result<String> {
    let document = Document::open(file)?;
    let mut out = format!(
        "File: {} ({} chars)\nPreview: {}...\n\n",
        file.display(),
        document.text().chars().count(),
        document.preview(200)
    );
    dispatcher.load(document);
    let config = dispatcher.pipeline().config();

    match &cli.command {
        Command::Segment { show } => {
            if let Outcome::Tokens(tokens) = request(dispatcher, Request::Tokens)? {
                let shown: Vec<&str> = tokens.iter().take(*show).map(String::as_str).collect();
                out.push_str(&format!(
                    "{}...\n\nTotal: {} words\n",
                    shown.join(" "),
                    tokens.len()
                ));
            }
        }
        Command::Frequency { top } => {
            let top_n = top.unwrap_or(config.frequency_top);
            if let Outcome::Frequency(rows) =
                request(dispatcher, Request::Frequency { top_n: Some(top_n) })?
            {
                out.push_str(&format!("Word frequency (top {}):\n\n", rows.len()));
                for (word, count) in rows {
                    out.push_str(&format!("{word}: {count}\n"));
                }
            }
        }
        Command::Pos { show, save } => {
            if let Outcome::Tags(tagged) = request(dispatcher, Request::Tags)? {
                let shown_count = (*show).min(tagged.len());
                out.push_str(&format!("Part of speech (first {shown_count}):\n\n"));
                let shown: Vec<String> = tagged
                    .iter()
                    .take(*show)
                    .map(|t| format!("{}/{}", t.word, t.tag))
                    .collect();
                out.push_str(&format!("{}\n", shown.join(" ")));
                if let Some(path) = save {
                    sink::save_tagged(&tagged, path)?;
                    info!("Tagged words saved to {}", path.display());
                }
            }
        }
        Command::Extract { categories, show } => {
            let outcomes: Vec<(EntityCategory, Result<Arc<EntityTable>>)> =
                if categories.is_empty() {
                    match request(dispatcher, Request::AllEntities)? {
                        Outcome::AllEntities(all) => {
                            all.into_iter().map(|e| (e.category, e.result)).collect()
                        }
                        _ => Vec::new(),
                    }
                } else {
                    categories
                        .iter()
                        .map(|name| EntityCategory::parse(name))
                        .filter_map(|category| {
                            match request(dispatcher, Request::Entities(category.clone())) {
                                Ok(Outcome::Entities(table)) => Some((category, Ok(table))),
                                Ok(_) => None,
                                Err(e) => Some((category, Err(e))),
                            }
                        })
                        .collect()
                };
            for (category, result) in outcomes {
                match result {
                    Ok(table) => {
                        out.push_str(&format!("{category} ({} distinct):\n", table.len()));
                        for (word, count) in table.top(*show) {
                            out.push_str(&format!("{word}: {count}\n"));
                        }
                        out.push('\n');
                    }
                    // a missing vocabulary only skips its own category
                    Err(e) if e.is_recoverable() => {
                        warn!("{}", e);
                        out.push_str(&format!("{category}: skipped ({e})\n\n"));
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Command::Visualize {
            kind,
            limit,
            relationships,
        } => {
            let path = match kind {
                VizKind::Bar => {
                    let limit = limit.unwrap_or(config.bar_limit);
                    let rows = frequency_rows(dispatcher, Some(limit))?;
                    let data = viz::for_bar_chart(&rows, limit, ChartText::default());
                    let path = config.output_dir.join("bar_chart.json");
                    viz::write_json(&data, &path)?;
                    path
                }
                VizKind::Wordcloud => {
                    let rows = frequency_rows(dispatcher, None)?;
                    let data = viz::for_word_cloud(&rows, config.word_cloud.clone());
                    let path = config.output_dir.join("word_cloud.json");
                    viz::write_json(&data, &path)?;
                    path
                }
                VizKind::Relationship => {
                    let rels = match relationships {
                        Some(file) => viz::load_relationships(file)?,
                        None => viz::default_relationships(),
                    };
                    let data = viz::for_relationship_graph(&rels)?;
                    let path = config.output_dir.join("relationship_graph.json");
                    viz::write_json(&data, &path)?;
                    path
                }
            };
            out.push_str(&format!("Visualization data written to {}\n", path.display()));
        }
        Command::Dict { out: dict_path, top } => {
            let rows = frequency_rows(dispatcher, Some(*top))?;
            vocabulary::write_custom_dict(&rows, dict_path)?;
            out.push_str(&format!(
                "Dictionary with {} entries written to {}\n",
                rows.len(),
                dict_path.display()
            ));
        }
    }
    Ok(out)
}

fn frequency_rows(dispatcher: &Dispatcher, top_n: Option<usize>) -> Result<Vec<(String, usize)>> {
    match request(dispatcher, Request::Frequency { top_n })? {
        Outcome::Frequency(rows) => Ok(rows),
        _ => Ok(Vec::new()),
    }
}
