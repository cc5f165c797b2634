use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use recital_core::audio::domain::speech_recognizer::SpeechRecognizer;
use recital_core::audio::infrastructure::whatlang_identifier::WhatlangIdentifier;
use recital_core::audio::infrastructure::whisper_recognizer::WhisperRecognizer;
use recital_core::jobs::event_bus::EventBus;
use recital_core::jobs::job_scheduler::{JobScheduler, JobState};
use recital_core::media::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use recital_core::media::infrastructure::ffmpeg_wav_writer::FfmpegWavWriter;
use recital_core::pipeline::asset_locator::AssetLocator;
use recital_core::pipeline::catalog::Catalog;
use recital_core::pipeline::split_audio_use_case::{SplitAudioUseCase, SplitServices};
use recital_core::shared::config::SplitterConfig;
use recital_core::shared::model_resolver;
use recital_core::verification::item_store::ItemStore;
use recital_core::verification::json_item_store::JsonItemStore;
use recital_core::verification::json_reference_table::JsonReferenceTable;
use recital_core::verification::reference_lookup::ReferenceLookup;

/// Split bilingual recitation recordings into their source-language and
/// English halves and verify the English against a reference translation.
#[derive(Parser)]
#[command(name = "recital")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the combined, source and English audio trees.
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Maximum number of splits running at once.
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Whisper ggml model file (skips the cache and download).
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split recordings automatically, streaming job events as they finish.
    Split {
        /// Asset ids (combined file stems), e.g. 114_1.
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Split one recording at an explicit timestamp.
    SplitAt {
        id: String,
        /// Cut position in milliseconds.
        #[arg(allow_negative_numbers = true)]
        ms: f64,
    },
    /// List every combined recording with its verification state.
    List,
    /// Mark a stored item as manually approved.
    Approve { id: String },
    /// Remove a stored item.
    Delete { id: String },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Split { ids } => run_split(&config, ids),
        Command::SplitAt { id, ms } => run_split_at(&config, &id, ms),
        Command::List => run_list(&config),
        Command::Approve { id } => {
            let item = build_catalog(&config)?.approve(&id)?;
            println!("{}", serde_json::to_string_pretty(&item)?);
            Ok(())
        }
        Command::Delete { id } => {
            if build_catalog(&config)?.delete(&id)? {
                println!("Deleted {id}");
            } else {
                println!("No stored item for {id}");
            }
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<SplitterConfig, Box<dyn std::error::Error>> {
    let mut config = SplitterConfig::load(cli.config.as_deref())?;
    if let Some(root) = &cli.data_root {
        config.data_root = root.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(model) = &cli.model {
        config.whisper_model_path = Some(model.clone());
    }
    config.validate()?;
    Ok(config)
}

fn run_split(config: &SplitterConfig, ids: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = build_scheduler(config)?;
    let runtime = build_runtime()?;

    let failed = runtime.block_on(async {
        // Subscribe before submitting; events published with no listener are dropped
        let subscription = scheduler.bus().subscribe();
        let expected = ids.len();
        let printer = tokio::spawn(async move {
            for _ in 0..expected {
                let Some(event) = subscription.recv().await else {
                    break;
                };
                match event.to_sse_frame() {
                    Ok(frame) => print!("{frame}"),
                    Err(e) => log::error!("Failed to encode event for {}: {e}", event.item_id()),
                }
            }
        });

        let mut tickets: Vec<_> = ids.iter().map(|id| scheduler.submit(id)).collect();
        let mut failed = 0;
        for ticket in &mut tickets {
            if ticket.wait().await == JobState::Failed {
                failed += 1;
            }
        }
        if let Err(e) = printer.await {
            log::error!("Event printer stopped: {e}");
        }
        failed
    });

    if failed > 0 {
        return Err(format!("{failed} of {} splits failed", ids.len()).into());
    }
    Ok(())
}

fn run_split_at(
    config: &SplitterConfig,
    id: &str,
    ms: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = build_scheduler(config)?;
    let runtime = build_runtime()?;
    let result = runtime.block_on(scheduler.split_at(id, ms))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_list(config: &SplitterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let entries = build_catalog(config)?.list();
    log::info!("{} combined recordings", entries.len());
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn build_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

fn build_scheduler(config: &SplitterConfig) -> Result<JobScheduler, Box<dyn std::error::Error>> {
    let references: Arc<dyn ReferenceLookup> =
        Arc::new(JsonReferenceTable::load(&config.reference_path)?);
    let store: Arc<dyn ItemStore> = Arc::new(JsonItemStore::open(&config.item_store_path)?);
    let identifier = WhatlangIdentifier::new(&config.source_language_id)?;
    let recognizer = build_recognizer(config)?;

    let use_case = SplitAudioUseCase::new(
        config,
        SplitServices {
            recognizer,
            identifier: Arc::new(identifier),
            reader: Arc::new(FfmpegAudioReader),
            writer: Arc::new(FfmpegWavWriter),
            references,
            store,
        },
    );
    Ok(JobScheduler::new(
        Arc::new(use_case),
        EventBus::new(),
        config.concurrency,
    ))
}

fn build_recognizer(
    config: &SplitterConfig,
) -> Result<Arc<dyn SpeechRecognizer>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", config.whisper_model_name);
    let model_path = model_resolver::resolve(
        &config.whisper_model_name,
        &config.whisper_model_url,
        config.whisper_model_path.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    log::info!("Loading Whisper model from {}", model_path.display());
    Ok(Arc::new(WhisperRecognizer::new(&model_path)?))
}

fn build_catalog(config: &SplitterConfig) -> Result<Catalog, Box<dyn std::error::Error>> {
    // Listing still works without a reference table; entries just lack translations
    let references: Arc<dyn ReferenceLookup> = match JsonReferenceTable::load(&config.reference_path) {
        Ok(table) => Arc::new(table),
        Err(e) => {
            log::warn!("{e}; listing without reference translations");
            Arc::new(JsonReferenceTable::from_value(Value::Object(Default::default())))
        }
    };
    let store: Arc<dyn ItemStore> = Arc::new(JsonItemStore::open(&config.item_store_path)?);
    Ok(Catalog::new(
        AssetLocator::from_config(config),
        references,
        store,
        config.match_wer_threshold,
    ))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading Whisper model... {pct}%");
    } else {
        eprint!("\rDownloading Whisper model... {downloaded} bytes");
    }
}
