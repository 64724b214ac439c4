//! Product catalog service.
//!
//! Serves the catalog HTTP API and keeps the catalog in step with
//! Contentful through the scheduled importer.
//!
//! Usage:
//!   catalog-api serve --port 3001
//!   catalog-api sync [--initial]
//!   catalog-api generate-api-key --output generated-api-key.txt

use anyhow::{bail, Context, Result};
use catalog_api::auth::{generate_api_key, generate_secret, parse_expires_in};
use catalog_api::config::{Cli, Command, GenerateKeyArgs, ImportArgs, ServeArgs, SyncArgs};
use catalog_api::{build_router, AppState};
use catalog_storage::{CursorStore, ProductStore};
use catalog_sync::{
    ContentfulClient, ImportProcessor, ImportQueue, ImportWorkerPool, QueueStats, SyncEngine,
    SyncOutcome, SyncScheduler,
};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    match cli.into_command() {
        Command::Serve(args) => serve(args).await,
        Command::Sync(args) => sync_once(args).await,
        Command::GenerateApiKey(args) => generate_key(args),
    }
}

/// Stores, queue, workers and engine for one process.
struct Importer {
    contentful: Arc<ContentfulClient>,
    engine: Arc<SyncEngine>,
    workers: ImportWorkerPool,
}

impl Importer {
    fn build(args: &ImportArgs, products: Arc<ProductStore>) -> Result<Option<Self>> {
        let Some(contentful) = args.contentful() else {
            return Ok(None);
        };
        let cursors = Arc::new(
            CursorStore::open(&args.database_path)
                .with_context(|| format!("failed to open {}", args.database_path.display()))?,
        );
        let locale = contentful.locale.clone();
        let contentful =
            Arc::new(ContentfulClient::new(contentful).context("invalid Contentful settings")?);

        let queue_config = args.queue();
        let (queue, rx) = ImportQueue::bounded(queue_config.capacity);
        let processor = Arc::new(ImportProcessor::new(products.clone(), locale));
        let workers = ImportWorkerPool::spawn(rx, processor, &queue_config);

        let engine = Arc::new(SyncEngine::new(
            contentful.clone(),
            cursors,
            products,
            Arc::new(queue),
            args.sync(),
        ));
        Ok(Some(Self {
            contentful,
            engine,
            workers,
        }))
    }

    /// Drops the engine, closing the queue, and waits for the workers.
    async fn finish(self) -> QueueStats {
        drop(self.engine);
        self.workers.join().await
    }
}

fn open_products(args: &ImportArgs) -> Result<Arc<ProductStore>> {
    let store = ProductStore::open(&args.database_path)
        .with_context(|| format!("failed to open {}", args.database_path.display()))?;
    Ok(Arc::new(store))
}

async fn serve(args: ServeArgs) -> Result<()> {
    let Some(secret) = args.jwt_secret.clone().filter(|s| !s.is_empty()) else {
        bail!("JWT_SECRET is not configured");
    };

    info!("Catalog API starting...");
    let products = open_products(&args.import)?;

    let importer = Importer::build(&args.import, products.clone())?;
    let scheduler = match &importer {
        Some(importer) => Some(SyncScheduler::start(importer.engine.clone(), args.sync_interval())),
        None => {
            warn!("Contentful space or access token not set; importer disabled");
            None
        }
    };

    let mut state = AppState::new(products, &secret).with_pagination(args.pagination());
    if let Some(importer) = &importer {
        state = state.with_contentful(importer.contentful.clone());
    }
    match args.rate_limit() {
        Some(limit) => {
            info!(
                requests = limit.max_requests,
                window_secs = limit.window.as_secs(),
                "Rate limiting enabled"
            );
            state = state.with_rate_limit(limit);
        }
        None => warn!("Rate limiting disabled"),
    }
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!("HTTP API listening on port {}", args.port);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    if let Some(importer) = importer {
        importer.finish().await;
    }
    info!("Catalog API stopped");
    Ok(())
}

async fn sync_once(args: SyncArgs) -> Result<()> {
    let products = open_products(&args.import)?;
    let Some(importer) = Importer::build(&args.import, products)? else {
        bail!("CONTENTFUL_SPACE_ID and CONTENTFUL_ACCESS_TOKEN must be set");
    };

    let outcome = if args.initial {
        importer.engine.initial_sync().await
    } else {
        importer.engine.sync().await
    };
    let stats = importer.finish().await;
    let outcome = outcome.context("sync failed")?;

    match outcome {
        SyncOutcome::Completed(report) => {
            println!("\n========================================");
            println!("  Sync Complete");
            println!("========================================");
            println!("  Mode:      {:?}", report.mode);
            println!("  Pages:     {}", report.pages);
            println!("  Enqueued:  {}", report.items_enqueued);
            println!("  Converged: {}", report.converged);
            if let Some(cursor) = &report.cursor {
                println!("  Cursor:    {cursor}");
            }
            println!("  Failed:    {}", stats.failed);
            println!("========================================\n");
        }
        SyncOutcome::AlreadyRunning => warn!("A sync was already running"),
    }
    Ok(())
}

fn generate_key(args: GenerateKeyArgs) -> Result<()> {
    let existing = args.jwt_secret.filter(|s| !s.is_empty());
    let secret = match &existing {
        Some(secret) => {
            println!("Using existing JWT_SECRET");
            secret.clone()
        }
        None => {
            println!("Generating new JWT_SECRET...");
            generate_secret()
        }
    };
    let Some(lifetime) = parse_expires_in(&args.expires_in) else {
        bail!("invalid JWT_EXPIRES_IN {:?}", args.expires_in);
    };
    let api_key = generate_api_key(&secret, lifetime).context("failed to sign API key")?;

    println!("\n========================================");
    println!("  Configuration");
    println!("========================================");
    println!("JWT_SECRET={secret}");
    println!("JWT_EXPIRES_IN={}", args.expires_in);
    println!("\n========================================");
    println!("  API Key");
    println!("========================================");
    println!("{api_key}");
    println!("\n  Authorization: Bearer <api-key>");
    println!("  curl -H \"Authorization: Bearer {api_key}\" http://localhost:3001/reports/products\n");

    let content = format!(
        "JWT_SECRET={secret}\nJWT_EXPIRES_IN={}\n\nAPI_KEY={api_key}\n\nGenerated at: {}\n",
        args.expires_in,
        chrono::Utc::now().to_rfc3339(),
    );
    std::fs::write(&args.output, content)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Key saved to: {}", args.output.display());

    if existing.is_none() {
        println!("\nJWT_SECRET is not set. Add this line to your .env file:");
        println!("  JWT_SECRET={secret}");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
