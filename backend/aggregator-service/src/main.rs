use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aggregator_service::{handlers, Aggregator, Config};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aggregator_service=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        "Starting aggregator-service v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        base_url = %config.base_url,
        max_concurrent_requests = config.max_concurrent_requests,
        upstream_timeout_secs = config.upstream_timeout_secs,
        "Configuration loaded"
    );

    let aggregator = web::Data::new(
        Aggregator::from_config(&config).context("Failed to build upstream client")?,
    );

    let cors_origins: Vec<String> = config.cors_origins().map(str::to_string).collect();
    let bind_addr = (config.bind_host.clone(), config.port);

    tracing::info!("Listening on http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &cors_origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(aggregator.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(bind_addr)
    .with_context(|| format!("Failed to bind {}:{}", config.bind_host, config.port))?
    .run()
    .await?;

    Ok(())
}
