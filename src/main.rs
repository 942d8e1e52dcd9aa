use std::sync::Arc;

use anyhow::Context;
use ramadhan::{
  plugins::{App, server, sweeper::Sweeper},
  state::{AppState, Config},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "ramadhan=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env().context("Invalid configuration")?;
  info!("Starting ramadhan v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(config).await?);

  let tasks = App::new().register(server::Plugin).register(Sweeper).run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for shutdown")?;
  info!("Shutting down");
  tasks.into_iter().for_each(|task| task.abort());

  Ok(())
}
