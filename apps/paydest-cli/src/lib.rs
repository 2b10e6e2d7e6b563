#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Parser;
use paydest_lnurl::{HttpLnurlResolver, LnurlResolver};
use paydest_parser::{Destination, Network, PublicKey, parse};
use paydest_scanner::{
    AlertSink, CancellationToken, ClipboardReader, DecisionOrchestrator, InputError,
    NavigationSink, Outcome, RawInput, Rejection, ScanSource,
};
use tokio::io::{AsyncBufReadExt, BufReader};

pub mod config;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "paydest")]
#[command(about = "Classify scanned or pasted payment destinations")]
#[command(version)]
pub struct PaydestCli {
    /// Active network (overrides PAYDEST_NETWORK)
    #[arg(long, global = true)]
    pub network: Option<Network>,
    /// Local node identity key, hex (overrides PAYDEST_NODE_PUBKEY)
    #[arg(long, global = true)]
    pub node_pubkey: Option<PublicKey>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Parse a string and print the destination as JSON
    Parse { input: String },
    /// Parse and resolve an LNURL, printing the resolution as JSON
    Resolve { input: String },
    /// Run one user action through the decision flow
    Classify {
        input: String,
        #[arg(long, default_value = "camera")]
        source: ScanSource,
    },
    /// Treat each stdin line as a camera frame until something navigable is found
    Scan,
}

pub async fn run(cli: PaydestCli) -> Result<ExitCode> {
    let mut config = Config::from_env().context("load configuration")?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(node_pubkey) = cli.node_pubkey {
        config.node_pubkey = Some(node_pubkey);
    }
    tracing::debug!(network = %config.network, "configuration loaded");

    match cli.command {
        Commands::Parse { input } => {
            let destination = parse(&input, &config.network_context());
            print_json(&destination)?;
            Ok(exit_code(destination.is_valid()))
        }
        Commands::Resolve { input } => {
            let Destination::LnurlPointer(pointer) = parse(&input, &config.network_context()) else {
                bail!("not an lnurl: {input}");
            };
            let resolver = HttpLnurlResolver::new(config.resolver_config())?;
            let resolution = resolver.resolve(&pointer).await;
            print_json(&resolution)?;
            Ok(exit_code(matches!(
                resolution,
                paydest_lnurl::LnurlResolution::PayRequest { .. }
            )))
        }
        Commands::Classify { input, source } => {
            let orchestrator = orchestrator(&config)?;
            let outcome = match source {
                ScanSource::Clipboard => match orchestrator.paste(&ArgumentClipboard(input)).await {
                    Ok(outcome) => outcome,
                    Err(InputError::EmptyClipboard) => None,
                    Err(error) => return Err(error.into()),
                },
                ScanSource::Camera | ScanSource::Image => {
                    orchestrator.classify(RawInput::new(input, source)).await
                }
            };
            Ok(exit_code(outcome.is_some_and(|outcome| outcome.is_navigable())))
        }
        Commands::Scan => {
            let orchestrator = orchestrator(&config)?;
            let lines = BufReader::new(tokio::io::stdin()).lines();
            let frames = futures::stream::unfold(lines, |mut lines| async move {
                match lines.next_line().await {
                    Ok(Some(line)) => Some((line, lines)),
                    Ok(None) => None,
                    Err(error) => {
                        tracing::warn!(%error, "stopped reading frames");
                        None
                    }
                }
            });
            let outcome = orchestrator.scan_frames(frames).await;
            Ok(exit_code(outcome.is_some()))
        }
    }
}

fn orchestrator(config: &Config) -> Result<DecisionOrchestrator> {
    let resolver: Arc<dyn LnurlResolver> =
        Arc::new(HttpLnurlResolver::new(config.resolver_config())?);
    let console = Arc::new(ConsoleSink);

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    Ok(
        DecisionOrchestrator::new(config.network_context(), resolver, console.clone(), console)
            .with_shutdown(shutdown),
    )
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("encode json")?;
    println!("{json}");
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Navigation goes to stdout as JSON, rejections to stderr as text.
struct ConsoleSink;

impl NavigationSink for ConsoleSink {
    fn navigate(&self, outcome: &Outcome) {
        if let Err(error) = print_json(outcome) {
            tracing::error!(%error, "failed to print outcome");
        }
    }
}

impl AlertSink for ConsoleSink {
    fn alert(&self, rejection: &Rejection) {
        eprintln!("{rejection}");
    }
}

struct ArgumentClipboard(String);

#[async_trait]
impl ClipboardReader for ArgumentClipboard {
    async fn read_text(&self) -> Result<Option<String>, InputError> {
        Ok(Some(self.0.clone()))
    }
}
