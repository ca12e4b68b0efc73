use pixelproof_api::app::{AppConfig, build_app};

#[tokio::main]
async fn main() {
    pixelproof_observability::init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);

    let app = build_app(AppConfig::from_env());

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .unwrap_or_else(|e| panic!("failed to bind {host}:{port}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // The worker finishes its in-flight iteration before exiting.
    app.worker.shutdown();
    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
