use std::sync::Arc;

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::{InMemoryAppointmentStore, SharedStore, SupabaseAppointmentStore};
use shared_config::{AppConfig, StoreBackend};

fn build_store(config: &AppConfig) -> anyhow::Result<SharedStore> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory appointment store");
            Ok(Arc::new(InMemoryAppointmentStore::new()))
        }
        StoreBackend::Supabase => {
            if !config.is_supabase_configured() {
                bail!("STORE_BACKEND=supabase requires SUPABASE_URL and SUPABASE_ANON_PUBLIC_KEY");
            }
            info!("Using Supabase appointment store at {}", config.supabase_url);
            Ok(Arc::new(SupabaseAppointmentStore::new(config)))
        }
    }
}

fn build_cors(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);

    if config.cors_allowed_origins.is_empty() {
        return Ok(cors.allow_origin(Any));
    }

    let origins = config.cors_allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid CORS origin: {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(cors.allow_origin(AllowOrigin::list(origins)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Appointment API server");

    let config = AppConfig::from_env();

    let store = build_store(&config)?;
    let cors = build_cors(&config)?;

    let app = router::create_router(store)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
