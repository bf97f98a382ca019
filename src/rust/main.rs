use emotion_detector::{
    analyze, format, shared_model, AnalysisError, AppState, BuiltinModel, ModelSettings,
    RuntimeConfig, WebConfig,
};
use clap::{Parser, Subcommand};
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(clap::Args, Debug, Clone)]
struct ModelArgs {
    /// Force a fresh download of the model files
    #[arg(short, long, global = true)]
    fresh: bool,

    /// Load model.onnx, tokenizer.json and config.json from this directory instead of downloading
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Longest input accepted, in tokens
    #[arg(long, global = true)]
    max_sequence_length: Option<usize>,

    /// Threads used inside each ONNX operator (0 lets the runtime decide)
    #[arg(long, default_value_t = 0, global = true)]
    intra_threads: usize,
}

impl ModelArgs {
    fn settings(&self) -> ModelSettings {
        ModelSettings {
            model: BuiltinModel::EmotionDistilRoberta,
            model_dir: self.model_dir.clone(),
            cache_dir: None,
            max_sequence_length: self.max_sequence_length,
            fresh: self.fresh,
            runtime: RuntimeConfig {
                intra_threads: self.intra_threads,
                ..RuntimeConfig::default()
            },
        }
    }

    fn model_name(&self) -> String {
        match &self.model_dir {
            Some(dir) => dir.display().to_string(),
            None => BuiltinModel::EmotionDistilRoberta.get_model_info().repo,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Serve the emotion detector page (default)
    Serve {
        /// Address to bind the HTTP listener to
        #[arg(long, default_value = "127.0.0.1:8501")]
        addr: SocketAddr,
    },
    /// Analyze one text and print the ranked emotions
    Analyze {
        /// The text to analyze
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    emotion_detector::init_logger();
    let args = Args::parse();

    info!("=== Starting Emotion Detector ===");
    let start_time = Instant::now();

    // A model that cannot be loaded is fatal: nothing below is usable without it.
    let model = shared_model(&args.model.settings()).await?;
    info!("=== Model loaded (took {:.2?}) ===", start_time.elapsed());

    match args.command {
        Some(Command::Analyze { text }) => Ok(print_analysis(model.as_ref(), &text)),
        serve => {
            let config = match serve {
                Some(Command::Serve { addr }) => WebConfig { addr },
                _ => WebConfig::default(),
            };
            let state = AppState::new(model, args.model.model_name());
            emotion_detector::serve(config, state).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_analysis(model: &dyn emotion_detector::EmotionModel, text: &str) -> ExitCode {
    let started = Instant::now();
    match analyze(model, text) {
        Ok(predictions) => {
            let result = format(&predictions);
            println!("\nPredicted Emotions:");
            for row in &result.table {
                println!("  {} {:<10} {:.4}", row.glyph, row.label, row.confidence);
            }
            info!("Classification took {:.2?}", started.elapsed());
            ExitCode::SUCCESS
        }
        Err(err @ AnalysisError::EmptyInput) => {
            eprintln!("Warning: {}", err);
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("\n{}", err);
            ExitCode::FAILURE
        }
    }
}
