//! JSON-over-HTTP surface of the attendance service.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::{get, post, put},
};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::{config::Settings, error::AppResult};

pub mod auth;
pub mod routes;
pub mod state;

use auth::{USER_ID_HEADER, USER_ROLE_HEADER};
use routes::{
    close_session_handler, cohort_handler, health_handler, list_sessions_handler, mark_handler,
    open_session_handler, report_handler, session_detail_handler, student_history_handler,
};
pub use state::AppState;

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/sessions",
            post(open_session_handler).get(list_sessions_handler),
        )
        .route("/sessions/{session_id}", get(session_detail_handler))
        .route("/sessions/{session_id}/close", put(close_session_handler))
        .route("/attendance", post(mark_handler))
        .route("/attendance/report", get(report_handler))
        .route(
            "/attendance/students/{student_id}",
            get(student_history_handler),
        )
        .route("/students", get(cohort_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(settings: Settings) -> AppResult<()> {
    info!("Initializing state...");
    let address = settings.address();
    let state = AppState::new(settings)?;

    info!("Starting server...");
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
