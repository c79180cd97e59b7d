use actix_web::middleware::{ErrorHandlers, NormalizePath, TrailingSlash};
use actix_web::{web, App, HttpServer};
use blog_service::config::StorageBackend;
use blog_service::db::{BlogStore, MemoryStore, PgStore};
use blog_service::middleware::{IdentityMiddleware, MetricsMiddleware};
use blog_service::error::render_error_response;
use blog_service::{handlers, routes, AppState, Config};
use db_pool::{create_pool, DbConfig};
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,actix_web=info,sqlx=warn";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn healthcheck() -> io::Result<()> {
    let port = std::env::var("BLOG_SERVICE_PORT").unwrap_or_else(|_| "8000".to_string());
    let url = format!("http://127.0.0.1:{}/health/", port);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

/// Blog Service
///
/// Serves the public feeds, post detail pages and the owner-only post and
/// comment forms. Identity comes from a session token issued by the
/// external login flow.
///
/// # Routes
///
/// - `/`, `/category/{slug}/`, `/profile/{username}/` - paginated feeds
/// - `/posts/...` - post detail, create/edit/delete, comments
/// - `/pages/about/`, `/pages/rules/` - static pages
/// - `/health/`, `/health/ready/`, `/health/live/`, `/metrics/` - operations
#[actix_web::main]
async fn main() -> io::Result<()> {
    // Support container healthchecks via CLI subcommand
    if let Some(cmd) = std::env::args().nth(1) {
        if cmd == "healthcheck" {
            return healthcheck().await;
        }
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let (store, pool): (Arc<dyn BlogStore>, Option<sqlx::PgPool>) = match config.storage {
        StorageBackend::Postgres => {
            let db_cfg = DbConfig::from_env(
                "blog-service",
                &config.database.url,
                config.database.max_connections,
            );
            db_cfg.log_config();
            let pool = match create_pool(db_cfg).await {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::error!("Database pool creation failed: {}", e);
                    eprintln!("ERROR: Failed to create database pool: {}", e);
                    std::process::exit(1);
                }
            };

            let pg = PgStore::new(pool.clone());
            pg.migrate().await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to run database migrations: {}", e),
                )
            })?;
            tracing::info!("Connected to database via db-pool crate");
            (Arc::new(pg) as Arc<dyn BlogStore>, Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            (Arc::new(MemoryStore::new()) as Arc<dyn BlogStore>, None)
        }
    };

    let bind_address = config.bind_address();
    let workers = config.app.workers;
    let auth = config.auth.clone();

    let mut state = AppState::new(store.clone(), config);
    if let Some(pool) = pool {
        state = state.with_pool(pool);
    }
    let state = web::Data::new(state);

    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(ErrorHandlers::new().default_handler(render_error_response))
            .wrap(MetricsMiddleware)
            .wrap(IdentityMiddleware::new(auth.clone(), store.clone()))
            .wrap(TracingLogger::default())
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .configure(routes::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&bind_address)?
    .workers(workers)
    .run();

    let server_handle = server.handle();

    tokio::select! {
        result = server => {
            if let Err(e) = &result {
                tracing::error!("HTTP server error: {}", e);
            }
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, stopping HTTP server");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("blog-service stopped");
    Ok(())
}
