use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use log::LevelFilter;
use relay_engine::{
    BridgePage, ControlRequest, ControlResponse, JsonFileStore, QueueStore, Relay,
    SchedulerTiming,
};
use relay_logging::{relay_debug, relay_info, relay_warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::cli::{Cli, Command};
use super::commands;
use super::config::{self, AppConfig, ConfigSource};
use super::logging;

pub fn run(cli: Cli) -> Result<()> {
    let (config, source) = config::load(&cli.config);
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log_destination, level);
    match source {
        ConfigSource::File => relay_info!("Loaded config from {:?}", cli.config),
        ConfigSource::Missing => relay_debug!("No config at {:?}, using defaults", cli.config),
        ConfigSource::Invalid(err) => {
            relay_warn!("Ignoring config {:?}, using defaults: {}", cli.config, err)
        }
    }

    let store = Arc::new(QueueStore::new(Arc::new(JsonFileStore::new(
        &config.store_path,
    ))));
    store
        .ensure_initialized()
        .with_context(|| format!("opening store {:?}", config.store_path))?;

    match cli.command {
        Command::Add { text, file, now } => {
            let raw = read_prompt_text(text, file)?;
            if now {
                block_on(send_now(&config, store, raw))
            } else {
                commands::add(&store, &raw)
            }
        }
        Command::List => commands::list(&store),
        Command::Show { index } => commands::show(&store, index),
        Command::Edit { index, text } => commands::edit(&store, index, &text),
        Command::Remove { index } => commands::remove(&store, index),
        Command::Move { from, to } => commands::move_prompt(&store, from, to),
        Command::Clear => commands::clear(&store),
        Command::Send { index } => block_on(send_from_queue(&config, store, index)),
        Command::Settings {
            poll_interval,
            auto_submit,
            delay,
        } => commands::settings(&store, poll_interval, auto_submit, delay).map(|_| ()),
        Command::Inspect => block_on(inspect(&config)),
        Command::Run => block_on(serve(&config, store)),
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(future)
}

fn read_prompt_text(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return fs::read_to_string(&path).with_context(|| format!("reading {:?}", path));
    }
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("reading prompts from stdin")?;
    Ok(raw)
}

fn bridge(config: &AppConfig) -> Result<BridgePage> {
    BridgePage::new(&config.bridge_url, config.bridge_settings())
        .with_context(|| format!("bridge url {:?}", config.bridge_url))
}

fn start_relay(config: &AppConfig, store: Arc<QueueStore>) -> Result<Relay> {
    let page = Arc::new(bridge(config)?);
    Ok(Relay::start(store, page, SchedulerTiming::default())?)
}

async fn send_now(config: &AppConfig, store: Arc<QueueStore>, raw: String) -> Result<()> {
    let relay = start_relay(config, store)?;
    let result = relay.send_now(&raw, Utc::now()).await;
    relay.shutdown().await;
    let queued = result?;
    println!("Sent first prompt; queued {queued} more");
    Ok(())
}

async fn send_from_queue(config: &AppConfig, store: Arc<QueueStore>, index: usize) -> Result<()> {
    let position = commands::position(index)?;
    let relay = start_relay(config, store)?;
    let result = relay.send_from_queue(position).await;
    relay.shutdown().await;
    let record = result?;
    println!("Sent \"{}\" ({} time(s) so far)", record.title, record.sent_count);
    Ok(())
}

async fn inspect(config: &AppConfig) -> Result<()> {
    let inspection = bridge(config)?.inspect().await?;
    commands::print_inspection(&inspection);
    Ok(())
}

/// Runs the relay with the status poller until stdin closes or Ctrl-C.
/// Each stdin line is one JSON control request; each response is written
/// to stdout as one JSON line.
async fn serve(config: &AppConfig, store: Arc<QueueStore>) -> Result<()> {
    let relay = start_relay(config, store)?;
    let cancel = CancellationToken::new();
    let poller = relay.spawn_status_poller(cancel.clone());
    relay_info!("Relay running against {}", config.bridge_url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let outcome: Result<()> = loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                relay_info!("Interrupted");
                break Ok(());
            }
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(err) => break Err(err.into()),
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ControlRequest>(&line) {
            Ok(request) => relay.handle(request).await,
            Err(err) => {
                relay_warn!("Malformed control request: {}", err);
                Some(ControlResponse::ack(false))
            }
        };
        if let Some(response) = response {
            if let Err(err) = write_response(&mut stdout, &response).await {
                break Err(err);
            }
        }
    };

    cancel.cancel();
    if let Err(err) = poller.await {
        relay_warn!("Status poller ended abnormally: {}", err);
    }
    relay.shutdown().await;
    relay_info!("Relay stopped");
    outcome
}

async fn write_response(stdout: &mut tokio::io::Stdout, response: &ControlResponse) -> Result<()> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
