use std::net::SocketAddr;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, CONTENT_TYPE},
    },
    middleware::map_response_with_state,
    routing::{patch, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use crate::{
    api,
    error::{Error, Result},
    state::AppState,
};

/// Build the relay router.
///
/// `cors_origin` is the single front-end origin allowed to call the relay,
/// or `*` to allow any origin.
pub fn router(state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = if cors_origin == "*" {
        AllowOrigin::any()
    } else {
        let origin = cors_origin
            .parse::<HeaderValue>()
            .map_err(|e| Error::Config(format!("invalid CORS origin {cors_origin:?}: {e}")))?;
        AllowOrigin::exact(origin)
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::PATCH])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let router = Router::new()
        .route("/create-conversation", post(api::create_conversation))
        .route("/create-response", post(api::create_response))
        .route(
            "/conversations/{conversation_id}/responses/{response_id}/feedback",
            post(api::create_feedback),
        )
        .route(
            "/conversations/{conversation_id}/responses/{response_id}/feedback/{feedback_id}",
            patch(api::update_feedback),
        )
        .fallback(api::not_found)
        .layer(map_response_with_state(state.clone(), api::redact_errors))
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// Serve `router` on `listener` until a shutdown signal is received.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    let address: SocketAddr = listener.local_addr()?;
    info!(%address, "Relay listening.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Unable to listen for shutdown signal.");
        std::future::pending::<()>().await;
    }
}
