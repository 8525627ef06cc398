use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse};
use tracing::Level;

use super::{
    appstate::AppState,
    configuration::Settings,
    routes::{capture, capture_preflight, health_check, not_found},
    utils::e500,
};

pub struct Application {
    port: u16,
    listener: tokio::net::TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, std::io::Error> {
        let addr = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        let campaign_client = configuration.campaign.client();
        let retry_policy = configuration.campaign.retry_policy();
        let router = app_router(AppState::new(campaign_client, retry_policy));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

pub fn app_router(state: AppState) -> Router {
    // The landing page is served from another origin, so the capture
    // endpoint answers cross-origin preflights itself.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::POST, axum::http::Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health_check", get(health_check))
        .route(
            "/api/email-capture",
            post(capture).options(capture_preflight),
        )
        .fallback(not_found)
        .layer(cors)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(default_span)
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new())
                .on_failure(DefaultOnFailure::new()),
        )
        .with_state(state)
}

// Whatever went wrong stays in the log; the caller only ever sees the
// generic message.
fn panic_response(_: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    tracing::error!("A request handler panicked");
    e500()
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for the shutdown signal");
    tracing::info!("Shutdown signal received");
}

fn default_span(request: &Request<Body>) -> tracing::Span {
    let request_id = uuid::Uuid::new_v4();
    tracing::span!(
        Level::DEBUG,
        "request",
        method = tracing::field::display(request.method()),
        uri = tracing::field::display(request.uri()),
        version = tracing::field::debug(request.version()),
        request_id = tracing::field::display(request_id),
    )
}
