//! A greeting web service with axum.

use greeting_api::{
    app,
    infra::{config, logging},
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _guard = logging::init_logging();
    let config = config::load_config()?;

    let listener = TcpListener::bind(format!(
        "{}:{}",
        config.server.http_address, config.server.http_port
    ))
    .await?;
    app::run_app(listener, config).await?;

    Ok(())
}
