//! Documentation of a clinic appointment backend.
//!
//!
//!
//! # General Infrastructure
//! - Patients, doctors and hospital admins share one account space
//! - Accounts live with an external identity provider, profiles in the `users` collection
//! - Appointments live in the `appointments` collection, booked elsewhere
//! - This server only validates and forwards, it holds no authoritative copy
//!
//!
//!
//! # Routes
//!
//! ## `PUT /api/appointment/status`
//! - Body: `{"appointmentId": string, "status": "scheduled" | "completed" | "cancelled"}`
//! - 200 `{"success": true, "message": ...}`
//! - 400 `{"error": "Missing required fields"}` or `{"error": "Invalid status"}`
//! - 404 when the appointment does not exist, the store never creates one on update
//! - 500 `{"error": ...}` carrying the store's message
//!
//! ## `POST /api/auth/register`
//! - Body: `{"email", "password", "displayName", "role"?, ...attributes}`
//! - Role defaults to patient
//! - Admins get a `hospitalId` of four random digits, a hyphen, and `pincode` (or `000000`)
//!
//! ## `POST /api/auth/login`
//! - Body: `{"email", "password", "role"?}`
//! - 403 when the stored role is not the one asked for
//! - 200 `{"user": profile, "idToken": ...}`
//!
//! ## `GET /api/auth/me`
//! - Header: `Authorization: Bearer <idToken>` from login
//! - 200 profile of the account behind the token
//! - 401 when the token is missing or the provider rejects it
//! - 404 when the account has no profile
//!
//!
//!
//! # Notes
//!
//! ## Sessions
//! Each request gets its own server-side session. Nothing is shared between
//! requests, so one caller can never sign another one out.
//!
//! ## Registration
//! Identity creation and the profile write are two separate remote calls. If
//! the profile write fails the identity is deleted again and the caller gets
//! a 500 naming the uid, so an orphan can be cleaned up by hand if the delete
//! failed too.
//!
//!
//!
//! # Setup
//!
//! Local run, everything in memory.
//! ```sh
//! RUST_LOG=info cargo run -p clinic
//! ```
//!
//! Hosted collaborators.
//! ```sh
//! CLINIC_BACKEND=hosted REDIS_URL=redis://localhost:6379 cargo run -p clinic
//! ```
//! The identity API key is read from `/run/secrets/IDENTITY_API_KEY`.
//!
//! Push access rules.
//! ```sh
//! cargo run -p rules -- --project my-clinic
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{login_handler, me_handler, register_handler, status_handler};
use state::State;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/appointment/status", put(status_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(me_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => error!("Failed to listen for Ctrl+C: {e}"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
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
