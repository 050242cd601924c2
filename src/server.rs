use axum::{
    body::Body,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::client::WordsApi;
use crate::error::WordgateError;
use crate::web::handlers;

#[derive(RustEmbed)]
#[folder = "static/"]
struct Asset;

pub struct WebServer {
    host: String,
    port: u16,
}

impl WebServer {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    pub async fn start(&self, api: Arc<dyn WordsApi>) -> Result<(), WordgateError> {
        let app = self.create_router(api);

        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| WordgateError::Error(format!("Invalid address: {}", e)))?;

        println!("🚀 Wordgate starting on http://{}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| WordgateError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("Server ready to handle requests");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_signal().await;
                log::info!("Shutdown signal received, stopping server");
            })
            .await
            .map_err(|e| WordgateError::Error(format!("Server error: {}", e)))?;

        log::info!("Server shutdown complete");

        Ok(())
    }

    fn create_router(&self, api: Arc<dyn WordsApi>) -> Router {
        Router::new()
            // Word list and moderation pages
            .route("/", get(handlers::words::get_all_words))
            .route(
                "/add-new-word",
                get(handlers::words::create_new_word).post(handlers::words::handle_create_new_word),
            )
            .route(
                "/delete",
                get(handlers::words::delete_word).post(handlers::words::handle_delete_word),
            )
            .route(
                "/word/{id}",
                get(handlers::word::get_word).post(handlers::word::post_update_word),
            )
            // Health check
            .route("/health", get(health_check))
            // Embedded assets
            .route("/static/{*path}", get(static_handler))
            // Share the word service with handlers
            .layer(Extension(api))
    }
}

async fn health_check() -> (StatusCode, &'static str) {
    log::debug!("GET healthcheck");

    (StatusCode::OK, "OK")
}

// Handler for embedded static files
async fn static_handler(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches("/static/");

    match Asset::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(content.data))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("404 Not Found"))
            .unwrap_or_else(|_| StatusCode::NOT_FOUND.into_response()),
    }
}

/// Waits for a shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
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
}
