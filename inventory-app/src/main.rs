//! # Inventory Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize tracing (optionally exporting spans over OTLP)
//! - Initialize the repository adapter
//! - Create the rate and inventory services and their background tasks
//! - Start the HTTP server and shut everything down on SIGINT/SIGTERM

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventory_hex::{
    InventoryService, PriceCacheUpdater, RateService, RefreshScheduler, ScheduleConfig,
    inbound::{HttpServer, shutdown_signal},
    outbound::HttpRateSource,
};
use inventory_repo::build_repo;

use config::{Config, LogFormat};

fn init_tracer(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("inventory-service"), provider))
}

/// Installs the global subscriber. Returns the OTLP provider when span
/// export is enabled so it can be flushed on exit.
fn init_tracing(config: &Config) -> anyhow::Result<Option<sdktrace::SdkTracerProvider>> {
    let otel = config.otlp_endpoint.as_deref().map(init_tracer).transpose()?;
    let (telemetry, provider) = match otel {
        Some((tracer, provider)) => (
            Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Some(provider),
        ),
        None => (None, None),
    };

    let (json, pretty) = match config.log_format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,inventory_app=debug,inventory_hex=debug".into()),
        )
        .with(json)
        .with(pretty)
        .with(telemetry)
        .init();

    Ok(provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let otel_provider = init_tracing(&config)?;

    tracing::info!("Starting inventory server on port {}", config.port);

    // Build repository (handles connection and migration)
    let repo = Arc::new(build_repo(&config.database_url).await?);
    tracing::info!(backend = repo.backend(), "Repository ready");

    let source = HttpRateSource::new(&config.rate_source_url, &config.rate_source_pointer)?;
    let rates = Arc::new(RateService::new(source, repo.clone(), config.default_rate));
    let price_cache = PriceCacheUpdater::spawn(repo.clone(), rates.subscribe());

    let restored = rates.restore().await;
    tracing::info!(rate = restored.rate.value(), source = %restored.source, "Initial exchange rate");

    let scheduler = if config.refresh_enabled {
        Some(RefreshScheduler::spawn(rates.clone(), ScheduleConfig::default()))
    } else {
        tracing::info!("Scheduled rate refresh disabled");
        None
    };

    let inventory = InventoryService::new(repo, rates.subscribe());

    let server = HttpServer::new(rates, inventory);
    let addr = format!("0.0.0.0:{}", config.port);
    let served = server.run(&addr, shutdown_signal()).await;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    price_cache.shutdown().await;

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    served
}
