use anyhow::Context;
use clap::Parser;
use spam_filtering::server::{self, AppState};
use spam_filtering::{Classifier, Config, Corpus, ModelHandle, RemoteScorer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SAMPLE_SPAM: &str = "07732584351 - Rodger Burns - MSG = We tried to call you re your reply to our sms for a free nokia mobile + free camcorder. Please call now 08000930705 for delivery tomorrow";

#[derive(Parser)]
#[command(version, about = "Naive Bayes spam classifier service")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(long)]
    listen: Option<String>,

    /// Training corpus CSV, overrides the config file
    #[arg(long)]
    data: Option<PathBuf>,

    /// Smoothing constant, overrides the config file
    #[arg(short = 'k', long)]
    smoothing: Option<f64>,

    /// Disable the remote scorer route
    #[arg(long)]
    no_remote: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spam_filtering=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(smoothing) = cli.smoothing {
        config.smoothing = smoothing;
    }
    if cli.no_remote {
        config.remote_scorer_url = None;
    }
    config.validate()?;

    let model = ModelHandle::unfitted(config.smoothing)?;

    let corpus = Corpus::load(&config.data_path)
        .with_context(|| format!("loading training data from {}", config.data_path.display()))?;
    let classifier = Classifier::trained(config.smoothing, corpus.messages())?;

    let probability = classifier.predict(SAMPLE_SPAM)?;
    info!(probability, "Sample spam prediction");
    model.publish(classifier);

    let remote = match config.remote_scorer_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => {
            let remote =
                RemoteScorer::new(url, Duration::from_secs(config.remote_timeout_seconds))?;
            info!("Remote scorer at {}", remote.url());
            Some(remote)
        }
        None => None,
    };

    let state = AppState {
        model,
        corpus: Arc::new(corpus),
        remote,
    };
    let app = server::router(state, config.static_dir.clone());

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Running web server on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
