use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::CorsOrigins;
use crate::state::{AuthState, GatewayState};
use crate::{auth, gateway};

/// Router of the authentication service: the internal RPC endpoint only.
pub fn build_auth_app(state: AuthState) -> Router {
    with_tracing(auth::router().with_state(state))
}

/// Router of the public gateway.
pub fn build_gateway_app(state: GatewayState, origins: &CorsOrigins) -> Router {
    with_tracing(
        gateway::router()
            .with_state(state)
            .layer(cors_layer(origins)),
    )
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => CorsLayer::permissive(),
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                // a wildcard cannot be combined with credentials
                .filter(|origin| origin.as_str() != "*")
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!(%origin, error = %e, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed))
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        }
    }
}

fn with_tracing(router: Router) -> Router {
    router.layer(
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
                 _latency: std::time::Duration,
                 span: &tracing::Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    if status.is_server_error() {
                        tracing::error!(%status, "response");
                    } else {
                        tracing::info!(%status, "response");
                    }
                },
            ),
    )
}

/// Binds `host:port`, resolving `host` if it is a name.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("bind {}:{}", host, port))
}

pub async fn serve(app: Router, (host, port): (&str, u16)) -> anyhow::Result<()> {
    let listener = bind(host, port).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
