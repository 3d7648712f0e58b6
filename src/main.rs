use std::path::PathBuf;

use clap::Parser;
use human_bytes::human_bytes;
use tracing::{error, info, warn};

use es_migrate::conf::Config;
use es_migrate::error::Result;
use es_migrate::es_client::EsClient;
use es_migrate::migrate::{self, CopyOptions, CopyStats, FlushErrorPolicy};
use es_migrate::{health, provision, resolver, settings};

#[derive(Parser, Debug)]
#[command(name = "es-migrate", version, about = "Copy documents and index metadata between two clusters")]
struct Args {
    /// Source cluster URL, or the name of an endpoint from --config
    #[arg(short = 's', long, value_name = "URL|NAME")]
    source: String,
    /// Destination cluster URL, or the name of an endpoint from --config
    #[arg(short = 'd', long, value_name = "URL|NAME")]
    dest: String,
    /// Documents per scroll page ("size" in the scroll request)
    #[arg(short = 'c', long = "count", default_value_t = 100)]
    page_size: u64,
    /// Scroll cursor lifetime
    #[arg(short = 't', long = "time", default_value = "1m")]
    scroll_ttl: String,
    /// Do not copy shard/replica settings from the source
    #[arg(long = "no-copy-settings")]
    no_copy_settings: bool,
    /// Delete destination indexes before copying
    #[arg(short = 'f', long = "force")]
    force_delete: bool,
    /// Indexes to copy, comma separated
    #[arg(short = 'i', long = "indexes", default_value = "_all")]
    index_pattern: String,
    /// Also copy indexes whose name starts with '.'
    #[arg(short = 'a', long = "all")]
    include_dot_names: bool,
    /// Number of bulk writer workers
    #[arg(short = 'w', long, default_value_t = 1)]
    workers: usize,
    /// Override the shard count copied from the source
    #[arg(long)]
    shards: Option<u64>,
    /// Keep the source replica counts instead of forcing them to 0
    #[arg(long)]
    replicate: bool,
    /// Require green cluster health instead of accepting yellow
    #[arg(long = "green")]
    require_green: bool,
    /// Copy documents only, assume indexes already exist
    #[arg(long = "docs-only", conflicts_with = "index_only")]
    docs_only: bool,
    /// Create indexes only, copy no documents
    #[arg(long = "index-only")]
    index_only: bool,
    /// What to do when the destination rejects a bulk flush
    #[arg(long = "on-flush-error", value_enum, default_value_t = FlushErrorPolicy::Drop)]
    on_flush_error: FlushErrorPolicy,
    /// Optional endpoints file (named endpoints with auth and CA roots)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(stats) => {
            println!("Indexed {} documents", stats.docs_written);
        }
        Err(err) => {
            error!("migration aborted: {err}");
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<CopyStats> {
    let started_at = chrono::Utc::now();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let source = EsClient::connect(config.resolve_endpoint(&args.source)).await?;
    let dest = EsClient::connect(config.resolve_endpoint(&args.dest)).await?;

    if let Err(err) = source.print_server_info("source").await {
        warn!("source did not answer the banner request: {err}");
    }
    if let Err(err) = dest.print_server_info("destination").await {
        warn!("destination did not answer the banner request: {err}");
    }

    let resolved = resolver::resolve(&source, &args.index_pattern, args.include_dot_names).await?;
    if resolved.definitions.is_empty() {
        info!("no indexes match {}, nothing to do", args.index_pattern);
        return Ok(CopyStats::default());
    }
    info!(
        "resolved {} index(es): {}",
        resolved.definitions.len(),
        resolved.scroll_pattern
    );

    if !args.docs_only {
        let mut definitions = resolved.definitions;
        if !args.no_copy_settings {
            let all_settings = source.get_all_settings().await?;
            definitions = settings::attach(definitions, &all_settings)?;
        }
        definitions = settings::force_replicas(definitions, args.replicate);
        definitions = settings::override_shards(definitions, args.shards);

        if args.force_delete {
            provision::delete_indexes(&dest, &definitions).await?;
        }
        provision::create_indexes(&dest, &definitions).await?;
    }

    if args.index_only {
        info!("--index-only set, skipping document copy");
        return Ok(CopyStats::default());
    }

    health::await_ready(&source, &dest, args.require_green).await?;

    let opts = CopyOptions {
        page_size: args.page_size.max(1),
        scroll_ttl: args.scroll_ttl.clone(),
        workers: args.workers.max(1),
        flush_error_policy: args.on_flush_error,
    };
    let stats = migrate::copy_documents(&source, &dest, &resolved.scroll_pattern, &opts).await?;

    info!(
        "run started {}: {} docs in {} flushes ({}) over {:.1}s, {} recoverable error(s)",
        started_at.to_rfc3339(),
        stats.docs_written,
        stats.flushes,
        human_bytes(stats.bytes_flushed as f64),
        stats.duration_secs,
        stats.errors,
    );
    if let Some(usage) = memory_stats::memory_stats() {
        info!("process memory: {}", human_bytes(usage.physical_mem as f64));
    }

    Ok(stats)
}
