//! LazyEl CLI - Main entry point
//!
//! 매니페스트로 컴포넌트를 선언하고, 문서 트리에 포함된 컴포넌트를 지연 로드한다.

mod manifest;

use clap::Parser;
use lazyel_core::{ComponentLoader, Element, LoaderEvent, MemoryHost};
use lazyel_foundation::{LoaderConfig, LOADER_CONFIG_FILE};
use manifest::Manifest;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// LazyEl - lazy component loader driver
#[derive(Parser, Debug)]
#[command(name = "lazyel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Component manifest (JSON)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Document tree to scan (JSON)
    #[arg(short = 'D', long)]
    document: PathBuf,

    /// Loader config (JSON, defaults to ./lazyel.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of scan passes over the document
    #[arg(short, long, default_value = "1")]
    passes: usize,

    /// Delay before the registry marks a definition visible (ms)
    #[arg(long, default_value = "0")]
    visibility_delay_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = match &args.config {
        Some(path) => LoaderConfig::load_from(path)?,
        None => LoaderConfig::load_or_default(LOADER_CONFIG_FILE)?,
    };

    let manifest = Manifest::load(&args.manifest)?;
    let document: Element = serde_json::from_str(&std::fs::read_to_string(&args.document)?)?;

    let mut host = MemoryHost::new();
    if args.visibility_delay_ms > 0 {
        host = host.with_visibility_delay(Duration::from_millis(args.visibility_delay_ms));
    }
    let loader = ComponentLoader::with_config(Arc::new(host), manifest.into_entries(), config);
    info!(
        "Loader ready (event capacity {}, slow load warning {}ms)",
        loader.config().event_capacity,
        loader.config().slow_load_warn_ms
    );

    // 라이프사이클 이벤트 출력
    let mut events = loader.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event watcher skipped {} event(s)", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match event {
                LoaderEvent::Started { selector } => println!("  ⋯ {}", selector),
                LoaderEvent::Loaded {
                    selector,
                    elapsed_ms,
                } => println!("  ✓ {} ({}ms)", selector, elapsed_ms),
                LoaderEvent::Failed { selector, error } => println!("  ✗ {}: {}", selector, error),
            }
        }
    });

    let mut failed = false;
    for pass in 1..=args.passes.max(1) {
        println!("Pass {}: {:?}", pass, loader.discover(&document));
        match loader.load_contained_components(&document).await {
            Ok(loaded) => {
                let selectors: Vec<_> = loaded.into_iter().map(|e| e.selector).collect();
                info!("Pass {} loaded {} component(s)", pass, selectors.len());
                println!("Pass {} complete: {:?}", pass, selectors);
            }
            Err(e) => {
                warn!("Pass {} failed: {}", pass, e);
                println!("Pass {} failed: {}", pass, e);
                failed = true;
            }
        }
    }

    let stats = loader.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("Defined: {:?}", loader.host().defined_names());

    // 남은 로드 태스크가 끝나면 채널이 닫히고 watcher도 종료
    drop(loader);
    if let Err(e) = watcher.await {
        warn!("Event watcher failed: {}", e);
    }

    if failed {
        anyhow::bail!("one or more components failed to load");
    }
    Ok(())
}
