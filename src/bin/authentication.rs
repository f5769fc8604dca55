use authgate::{app, config::AuthServiceConfig, state::AuthState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("authgate=debug,authentication=debug,tower_http=info");

    let config = AuthServiceConfig::from_env()?;
    let state = AuthState::init(&config).await?;

    app::serve(app::build_auth_app(state), config.listen_on()).await
}
