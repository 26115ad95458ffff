use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{any, get},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;

use super::{services, state::AppState};
use crate::config::{Config, CorsConfig};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

const CORS_METHODS: [Method; 5] = [
    Method::POST,
    Method::GET,
    Method::OPTIONS,
    Method::PUT,
    Method::DELETE,
];

/// Build the route table. It is constructed once and never mutated.
///
/// Transform routes accept every method so that the upload extractor can
/// answer non-POST requests with 405 and a JSON body.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let routes = Router::new()
        .route("/health", get(services::health))
        .route("/resize", any(services::resize))
        .route("/compress", any(services::compress))
        .route("/convert", any(services::convert))
        .route("/flip", any(services::flip))
        .route("/rotate", any(services::rotate))
        .route("/crop", any(services::crop));

    let app = if config.server.api_prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&config.server.api_prefix, routes)
    };

    let headers = allowed_headers(&config.cors);

    app.fallback(services::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(headers.clone()))
                // Preflights are answered by the CorsLayer above; everything
                // else gets the method and header lists here.
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    join_header_value(CORS_METHODS.iter().map(Method::as_str)),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    join_header_value(headers.iter().map(HeaderName::as_str)),
                ))
                .layer(DefaultBodyLimit::max(config.limits.max_upload_bytes.as_usize())),
        )
}

fn allowed_headers(cors: &CorsConfig) -> Vec<HeaderName> {
    cors.allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect()
}

/// Any origin; every OPTIONS request is answered as a preflight.
fn cors_layer(headers: Vec<HeaderName>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(CORS_METHODS)
        .allow_headers(headers)
}

/// `None` leaves the header off instead of sending an invalid value.
fn join_header_value<'a>(items: impl Iterator<Item = &'a str>) -> Option<HeaderValue> {
    let joined = items.collect::<Vec<_>>().join(", ");
    HeaderValue::from_str(&joined).ok()
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let address = config.server.bind_addr;
    info!(
        prefix = %config.server.api_prefix,
        max_upload = %config.limits.max_upload_bytes,
        "Building routes"
    );

    let app = router(AppState::new(config));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "imagebox listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
