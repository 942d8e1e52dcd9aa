//! Periodic removal of expired bearer tokens

use crate::{prelude::*, state::AppState};

pub struct Sweeper;

impl Sweeper {
  pub async fn sweep(app: &AppState) -> Result<u64> {
    let purged = app.sv().auth.purge_expired().await?;
    if purged > 0 {
      debug!("Purged {purged} expired tokens");
    }
    Ok(purged)
  }
}

#[async_trait]
impl super::Plugin for Sweeper {
  fn name(&self) -> &'static str {
    "sweeper"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = time::interval(app.config.sweep_interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
      interval.tick().await;
      Self::sweep(&app).await.context("Token sweep failed")?;
    }
  }
}
