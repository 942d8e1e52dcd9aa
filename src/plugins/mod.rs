pub mod server;
pub mod sweeper;

use tokio::time::sleep;

use crate::{prelude::*, state::AppState};

const RESTART_DELAY: Duration = Duration::from_secs(5);

/// A long-running part of the server, restarted whenever it exits.
#[async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Spawns every plugin under its own supervisor and returns immediately.
  pub fn run(self, app: Arc<AppState>) -> Vec<tokio::task::JoinHandle<()>> {
    self
      .plugins
      .into_iter()
      .map(|plugin| tokio::spawn(supervise(plugin, app.clone())))
      .collect()
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>) {
  let name = plugin.name();
  info!("Plugin `{name}` started");

  loop {
    let task = tokio::spawn({
      let (plugin, app) = (plugin.clone(), app.clone());
      async move { plugin.start(app).await }
    });

    match task.await {
      Ok(Ok(())) => warn!("Plugin `{name}` returned, restarting"),
      Ok(Err(err)) => error!("Plugin `{name}` failed: {err:#}"),
      Err(err) if err.is_cancelled() => {
        info!("Plugin `{name}` cancelled");
        break;
      }
      Err(_) => error!("Plugin `{name}` panicked"),
    }

    sleep(RESTART_DELAY).await;
    info!("Restarting plugin `{name}`");
  }
}
