//! petclass - cat vs dog classifier service
//!
//! Serves the classifier over HTTP by default; `predict` and `inspect` run the
//! same engine against local files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use petclass::server::{self, ServerConfig};
use petclass::{Classifier, Prediction};

#[derive(Parser, Debug)]
#[command(name = "petclass")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cat vs dog image classifier")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Flags for the default `serve` mode
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve(ServeArgs),

    /// Classify local image files and print one JSON line per image
    Predict {
        #[command(flatten)]
        model: ModelArg,

        /// Images to classify
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Load the weights and print the network summary
    Inspect {
        #[command(flatten)]
        model: ModelArg,
    },
}

#[derive(Args, Debug)]
struct ModelArg {
    /// Safetensors weights file
    #[arg(short, long, env = "MODEL_PATH", default_value = server::DEFAULT_MODEL_PATH)]
    model: PathBuf,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = server::DEFAULT_PORT)]
    port: u16,

    #[command(flatten)]
    model: ModelArg,

    /// Origin allowed to call the API from a browser (`*` for any)
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = server::DEFAULT_ALLOWED_ORIGIN)]
    allowed_origin: String,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_UPLOAD_SIZE", default_value_t = server::DEFAULT_MAX_UPLOAD_SIZE)]
    max_upload_size: usize,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            model_path: args.model.model,
            allowed_origin: args.allowed_origin,
            max_upload_size: args.max_upload_size,
        }
    }
}

#[derive(Serialize)]
struct FilePrediction<'a> {
    file: &'a Path,
    #[serde(flatten)]
    prediction: Prediction,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petclass=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => server::run_server(args.into()).await?,
        Some(Commands::Predict { model, images }) => cmd_predict(&model.model, &images)?,
        Some(Commands::Inspect { model }) => cmd_inspect(&model.model)?,
        None => server::run_server(cli.serve.into()).await?,
    }

    Ok(())
}

fn load_classifier(path: &Path) -> anyhow::Result<Classifier> {
    Classifier::load(path).with_context(|| format!("failed to load model from {}", path.display()))
}

fn cmd_predict(model: &Path, images: &[PathBuf]) -> anyhow::Result<()> {
    let classifier = load_classifier(model)?;
    info!(model = %model.display(), images = images.len(), "Classifying files");

    for path in images {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let prediction = classifier
            .classify_bytes(&bytes)
            .with_context(|| format!("failed to classify {}", path.display()))?;

        let line = serde_json::to_string(&FilePrediction {
            file: path,
            prediction,
        })?;
        println!("{}", line);
    }

    Ok(())
}

fn cmd_inspect(model: &Path) -> anyhow::Result<()> {
    let classifier = load_classifier(model)?;
    print!("{}", classifier.model().summary());
    Ok(())
}
