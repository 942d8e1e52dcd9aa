//! Weekly and monthly summaries, computed from raw records on every read

use futures::future::try_join_all;
use serde::Serialize;

use crate::{
  prelude::*,
  tracker::{Health, MonthRecords, Tracker},
  utils::Month,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayPoint {
  pub date: Date,
  pub ibadah_percent: u32,
  pub pages: u32,
  pub sedekah: i64,
  pub water_glasses: i32,
}

/// The seven days ending at `today`, oldest first.
pub async fn weekly(tracker: &dyn Tracker, today: Date) -> Result<Vec<DayPoint>> {
  let days = utils::last_days(today, 7);
  let sedekah = tracker.sedekah().await?;

  let points = days.into_iter().map(|date| {
    let sedekah = &sedekah;
    async move {
      let (ibadah, pages, health) = tokio::try_join!(
        tracker.ibadah(date),
        tracker.quran_pages(date),
        tracker.health(date),
      )?;

      Ok::<_, Error>(DayPoint {
        date,
        ibadah_percent: ibadah.percent(),
        pages,
        sedekah: sedekah
          .iter()
          .filter(|entry| entry.date == date)
          .map(|entry| entry.amount)
          .sum(),
        water_glasses: health.water_glasses,
      })
    }
  });

  try_join_all(points).await
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recap {
  pub month: String,
  /// Days with a stored checklist.
  pub days_tracked: u32,
  pub avg_ibadah_percent: u32,
  pub total_pages: u32,
  pub total_sedekah: i64,
  pub sedekah_count: usize,
  /// Spread over every day of the month, tracked or not.
  pub avg_daily_sedekah: i64,
  pub avg_water_glasses: f64,
  pub fruit_days: u32,
  pub exercise_days: u32,
  pub avg_sleep_hours: f64,
}

fn mean(sum: f64, n: usize) -> f64 {
  if n == 0 { 0.0 } else { sum / n as f64 }
}

impl Recap {
  pub fn fold(month: Month, records: &MonthRecords) -> Self {
    let ibadah = &records.ibadah;
    let health = &records.health;

    let percents: f64 =
      ibadah.iter().map(|(_, day)| f64::from(day.percent())).sum();
    let total_sedekah: i64 =
      records.sedekah.iter().map(|entry| entry.amount).sum();
    let count = |f: fn(&Health) -> bool| {
      health.iter().filter(|(_, day)| f(day)).count() as u32
    };

    Self {
      month: month.to_string(),
      days_tracked: ibadah.len() as u32,
      avg_ibadah_percent: mean(percents, ibadah.len()).round() as u32,
      total_pages: records.quran.iter().map(|(_, pages)| pages).sum(),
      total_sedekah,
      sedekah_count: records.sedekah.len(),
      avg_daily_sedekah: total_sedekah / i64::from(month.days()),
      avg_water_glasses: mean(
        health.iter().map(|(_, day)| f64::from(day.water_glasses)).sum(),
        health.len(),
      ),
      fruit_days: count(|day| day.ate_fruit),
      exercise_days: count(|day| day.exercised),
      avg_sleep_hours: mean(
        health.iter().map(|(_, day)| day.sleep_hours).sum(),
        health.len(),
      ),
    }
  }
}

pub async fn monthly(tracker: &dyn Tracker, month: Month) -> Result<Recap> {
  let records = tracker.month(month).await?;
  Ok(Recap::fold(month, &records))
}

/// Progress towards the month's reading target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Khatam {
  pub target_pages: u32,
  pub pages_read: u32,
  /// Capped at 100.
  pub percent: u32,
  pub pages_left: u32,
  pub pages_per_day: u32,
  pub pages_per_prayer: u32,
}

impl Khatam {
  pub fn new(pages_read: u32, quran_target: i32, ramadhan_day: i32) -> Self {
    let target_pages = utils::khatam_pages(quran_target);
    let pages_left = target_pages.saturating_sub(pages_read);
    let remaining = u32::try_from(30 - ramadhan_day + 1).unwrap_or(0);
    let pages_per_day =
      if remaining == 0 { 0 } else { pages_left.div_ceil(remaining) };

    Self {
      target_pages,
      pages_read,
      percent: utils::percent(u64::from(pages_read), u64::from(target_pages))
        .min(100),
      pages_left,
      pages_per_day,
      pages_per_prayer: pages_per_day.div_ceil(5),
    }
  }
}
