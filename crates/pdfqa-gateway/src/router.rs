use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, DefaultBodyLimit, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{Extensions, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::handlers::{health_handler, list_handler, upload_handler};
use super::rate_limit::{RateDecision, RateLimiter};
use super::server::AppState;
use super::ws::ws_handler;

pub(crate) const RATE_LIMITED: &str = "Rate limit exceeded. Try again later.";

fn client_ip(extensions: &Extensions) -> IpAddr {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ci| ci.0.ip())
}

/// Peer address of the connection, or `0.0.0.0` when the server was not
/// started with connect info.
pub(crate) struct ClientIp(pub IpAddr);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(&parts.extensions)))
    }
}

pub(crate) fn build_router(state: AppState, max_body_size: usize) -> Router {
    // The QA channel checks the limiter per message, not on upgrade.
    let limited = Router::new()
        .route("/upload/", post(upload_handler))
        .route("/get_all_pdfs/", get(list_handler))
        .route("/health", get(health_handler))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/ws/qa/", get(ws_handler))
        .merge(limited)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_body_size)),
        )
        .with_state(state)
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(req.extensions());
    if limiter.check(ip, Instant::now()).await == RateDecision::Limited {
        tracing::info!(%ip, path = %req.uri().path(), "request rate limited");
        return ApiError::new(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED).into_response();
    }
    next.run(req).await
}
