use anyhow::Context;
use backend_api::{init_tracing, run_server, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // settings.json (optional) + .env + environment overrides
    let settings = settings_loader::load_from_env().context("loading settings")?;

    info!(
        host = %settings.server.host,
        port = settings.server.port,
        jsonbin = settings.jsonbin.is_configured(),
        legacy_file = %settings.legacy.data_file.display(),
        "trade journal API starting"
    );

    let state = AppState::from_settings(&settings)?;
    run_server(state, &settings.server.host, settings.server.port).await?;

    Ok(())
}
