// saccade-server main.rs
// Real-time delivery service for gaze/pointer motion scoring

use saccade_server::{build_router, build_state, ReplyMode};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saccade_server=info".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Get port from CLI args or environment
    let port: u16 = args
        .iter()
        .position(|a| a == "--port" || a == "-p")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .or_else(|| {
            std::env::var("SACCADE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
        })
        .unwrap_or(3000);

    // Get reply mode from CLI args or environment
    let reply_mode: ReplyMode = args
        .iter()
        .position(|a| a == "--reply-mode" || a == "-r")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| ReplyMode::from_str(s))
        .or_else(|| {
            std::env::var("SACCADE_REPLY_MODE")
                .ok()
                .and_then(|s| ReplyMode::from_str(&s))
        })
        .unwrap_or_default();

    tracing::info!("📡 Port: {}", port);
    tracing::info!("🔁 Reply mode: {}", reply_mode.as_str());

    let state = build_state(reply_mode);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("🚀 Saccade scoring service running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");
    tracing::info!("Shutting down...");
}
