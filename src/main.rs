use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use pg_decoding_json::checkpoint::CheckpointManager;
use pg_decoding_json::{Config, Error, Replayer};
use std::path::PathBuf;
use tokio::io::AsyncWrite;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "pg-decoding-json")]
#[command(about = "Replay a pgoutput capture as a JSON change stream", long_about = None)]
struct Args {
    /// Capture file: length-prefixed XLogData frames
    #[arg(value_name = "CAPTURE")]
    input: PathBuf,

    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write JSON lines here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Checkpoint file, overriding the configuration
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<PathBuf>,

    #[arg(long, help = "Delete the checkpoint and replay from the first frame")]
    reset_checkpoint: bool,

    #[arg(long, help = "Quote every identifier in table names")]
    quote_all_identifiers: bool,

    #[arg(short, long, help = "Enable JSON output for logs")]
    json_logs: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, args.verbose);

    info!("Starting pg-decoding-json");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Config::from_file(path)
        }
        None => Config::from_env(),
    }
    .map_err(|e| {
        error!("Failed to load configuration: {}", e);
        Error::from(e)
    })?;

    if args.checkpoint.is_some() {
        config.replay.checkpoint_file = args.checkpoint.clone();
    }
    if args.quote_all_identifiers {
        config.plugin.quote_all_identifiers = true;
    }

    info!(
        capture = ?args.input,
        output = ?args.output,
        checkpoint_file = ?config.replay.checkpoint_file,
        checkpoint_interval_commits = config.replay.checkpoint_interval_commits,
        quote_all_identifiers = config.plugin.quote_all_identifiers,
        "Configuration summary"
    );

    if args.reset_checkpoint {
        if let Some(path) = &config.replay.checkpoint_file {
            CheckpointManager::new(path).delete().await?;
        }
    }

    let capture = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("reading capture {:?}", args.input))?;

    let sink: Box<dyn AsyncWrite + Unpin + Send> = match &args.output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("creating output {:?}", path))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };

    let mut replayer = Replayer::new(config);

    let result = tokio::select! {
        result = replayer.run(Bytes::from(capture), sink) => result,
        _ = tokio::signal::ctrl_c() => Err(Error::Shutdown),
    };

    match result {
        Ok(summary) => {
            info!(
                messages = summary.messages,
                transactions = summary.transactions,
                "Replay complete"
            );
            Ok(())
        }
        Err(Error::Shutdown) => {
            info!("Shutdown requested, stopping replay");
            Ok(())
        }
        Err(e) => {
            error!("Replay failed: {}", e);
            Err(e.into())
        }
    }
}

fn init_logging(json: bool, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("pg_decoding_json=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("pg_decoding_json=info,warn"))
    };

    // Logs go to stderr so stdout carries only the change stream.
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
