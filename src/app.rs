use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{appointments, auth, lawyers, photos::UPLOADS_ROUTE, state::AppState};

pub fn build_app(state: AppState) -> Router {
    let upload_dir = state.config.upload_dir.clone();
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(|| async { "Lawfirm server is running" }))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router(max_upload_bytes))
        .merge(appointments::router())
        .merge(lawyers::router())
        .nest_service(UPLOADS_ROUTE, ServeDir::new(upload_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        state::AppState,
        testing::{get, send_text},
    };

    #[tokio::test]
    async fn root_and_health_respond() {
        let (status, text) = send_text(super::build_app(AppState::fake()), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Lawfirm server is running");

        let (status, text) = send_text(super::build_app(AppState::fake()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn uploads_are_served_from_the_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("123-456.png"), b"png-bytes")
            .await
            .unwrap();
        let config = crate::config::AppConfig {
            upload_dir: dir.path().to_path_buf(),
            ..crate::config::AppConfig::for_tests()
        };
        let state = AppState::fake().with_config(config);

        let (status, text) =
            send_text(super::build_app(state.clone()), get("/uploads/123-456.png")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "png-bytes");

        let (status, _) = send_text(super::build_app(state), get("/uploads/missing.png")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, _) = send_text(super::build_app(AppState::fake()), get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
