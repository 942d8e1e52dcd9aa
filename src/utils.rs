use std::fmt;

use serde::Serialize;

use crate::prelude::*;

/// Pages in one complete reading of the Qur'an.
pub const KHATAM_PAGES: u32 = 604;

/// Pages needed for `target` complete readings; saturates instead of
/// wrapping on absurd targets.
pub fn khatam_pages(target: i32) -> u32 {
  KHATAM_PAGES.saturating_mul(u32::try_from(target.max(1)).unwrap_or(1))
}

pub fn today() -> Date {
  Utc::now().date_naive()
}

pub fn format_date(date: DateTime) -> String {
  date.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Rounds half up, like the dashboards expect (`6/12 -> 50`, `1/12 -> 8`).
pub fn percent(done: u64, total: u64) -> u32 {
  if total == 0 {
    return 0;
  }
  let rounded = (done * 200 + total) / (total * 2);
  u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// The `n` calendar days ending at `today`, oldest first.
pub fn last_days(today: Date, n: u32) -> Vec<Date> {
  (0..n).rev().map(|back| today - TimeDelta::days(i64::from(back))).collect()
}

/// Upper-cases and trims a user-typed activation code.
pub fn normalize_code(raw: &str) -> String {
  raw.trim().to_uppercase()
}

pub fn bearer(header: &str) -> Option<&str> {
  header.strip_prefix("Bearer ").map(str::trim).filter(|token| !token.is_empty())
}

/// A calendar month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Month {
  first: Date,
}

impl Month {
  pub fn new(year: i32, month: u32) -> Option<Self> {
    Date::from_ymd_opt(year, month, 1).map(|first| Self { first })
  }

  pub fn of(date: Date) -> Self {
    Self { first: date - TimeDelta::days(i64::from(date.day0())) }
  }

  pub fn current() -> Self {
    Self::of(today())
  }

  pub fn first_day(&self) -> Date {
    self.first
  }

  pub fn last_day(&self) -> Date {
    let next = Self::of(self.first + TimeDelta::days(32));
    next.first - TimeDelta::days(1)
  }

  pub fn days(&self) -> u32 {
    self.last_day().day()
  }

  pub fn contains(&self, date: Date) -> bool {
    self.first <= date && date <= self.last_day()
  }

  pub fn previous(&self) -> Self {
    Self::of(self.first - TimeDelta::days(1))
  }

  /// Key prefix shared by every ISO date of this month, e.g. `2026-03-`.
  pub fn prefix(&self) -> String {
    format!("{}-", self)
  }
}

impl fmt::Display for Month {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.first.format("%Y-%m"))
  }
}
