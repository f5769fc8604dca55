use authgate::{app, config::GatewayConfig, state::GatewayState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("authgate=debug,gateway=debug,axum=info,tower_http=info");

    let config = GatewayConfig::from_env()?;
    tracing::info!(upstream = %config.auth_service_url, "forwarding auth calls");
    let state = GatewayState::init(&config)?;

    app::serve(app::build_gateway_app(state, &config.cors), config.listen_on()).await
}
