//! Daily prayer schedule from an Aladhan-compatible timings API

use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Salah {
  Subuh,
  Dzuhur,
  Ashar,
  Maghrib,
  Isya,
}

impl Salah {
  pub const ALL: [Salah; 5] =
    [Self::Subuh, Self::Dzuhur, Self::Ashar, Self::Maghrib, Self::Isya];

  /// Field name in the upstream `timings` object.
  fn upstream(self) -> &'static str {
    match self {
      Self::Subuh => "Fajr",
      Self::Dzuhur => "Dhuhr",
      Self::Ashar => "Asr",
      Self::Maghrib => "Maghrib",
      Self::Isya => "Isha",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
  pub salah: Salah,
  #[serde(serialize_with = "hh_mm")]
  pub time: NaiveTime,
  pub passed: bool,
}

fn hh_mm<S: serde::Serializer>(
  time: &NaiveTime,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.collect_str(&time.format("%H:%M"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrayerTimes {
  pub date: Date,
  times: [(Salah, NaiveTime); 5],
}

impl PrayerTimes {
  pub fn new(date: Date, times: [(Salah, NaiveTime); 5]) -> Self {
    Self { date, times }
  }

  pub fn time(&self, salah: Salah) -> Option<NaiveTime> {
    self.times.iter().find(|(s, _)| *s == salah).map(|(_, time)| *time)
  }

  /// The five prayers in order; a prayer counts as passed once `now` is
  /// strictly after its time.
  pub fn schedule(&self, now: NaiveTime) -> Vec<Slot> {
    self
      .times
      .iter()
      .map(|&(salah, time)| Slot { salah, time, passed: now > time })
      .collect()
  }

  /// First prayer not yet passed, wrapping to tomorrow's Subuh after Isya.
  pub fn next(&self, now: NaiveTime) -> Slot {
    let schedule = self.schedule(now);
    schedule
      .iter()
      .copied()
      .find(|slot| !slot.passed)
      .unwrap_or(Slot { passed: false, ..schedule[0] })
  }
}

#[derive(Deserialize)]
struct Envelope {
  data: Data,
}

#[derive(Deserialize)]
struct Data {
  timings: HashMap<String, String>,
}

/// Upstream values look like `04:35` or `04:35 (WIB)`.
fn parse_time(raw: &str) -> Option<NaiveTime> {
  let clock = raw.split_whitespace().next()?;
  NaiveTime::parse_from_str(clock, "%H:%M").ok()
}

#[derive(Debug, Clone)]
pub struct Prayer {
  client: reqwest::Client,
  base_url: String,
  method: u32,
}

impl Prayer {
  pub fn new(base_url: impl Into<String>, method: u32) -> Self {
    Self::with_client(reqwest::Client::new(), base_url, method)
  }

  pub fn with_client(
    client: reqwest::Client,
    base_url: impl Into<String>,
    method: u32,
  ) -> Self {
    let base_url = base_url.into().trim_end_matches('/').to_string();
    Self { client, base_url, method }
  }

  pub async fn timings(
    &self,
    city: &str,
    country: &str,
    date: Date,
  ) -> Result<PrayerTimes> {
    let url =
      format!("{}/timingsByCity/{}", self.base_url, date.format("%d-%m-%Y"));

    let method = self.method.to_string();
    let envelope: Envelope = self
      .client
      .get(&url)
      .query(&[
        ("city", city),
        ("country", country),
        ("method", method.as_str()),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    let mut times = Salah::ALL.map(|salah| (salah, NaiveTime::MIN));
    for (salah, time) in times.iter_mut() {
      let raw = envelope.data.timings.get(salah.upstream()).ok_or_else(|| {
        Error::Internal(format!("timings response lacks {}", salah.upstream()))
      })?;
      *time = parse_time(raw).ok_or_else(|| {
        Error::Internal(format!("unparseable prayer time `{raw}`"))
      })?;
    }

    debug!("Fetched prayer times for {city}, {country} on {date}");
    Ok(PrayerTimes::new(date, times))
  }
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, extract::Path, routing::get};

  use super::*;

  fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
  }

  fn sample() -> PrayerTimes {
    PrayerTimes::new(
      Date::from_ymd_opt(2026, 3, 1).unwrap(),
      [
        (Salah::Subuh, at(4, 35)),
        (Salah::Dzuhur, at(12, 1)),
        (Salah::Ashar, at(15, 14)),
        (Salah::Maghrib, at(18, 10)),
        (Salah::Isya, at(19, 20)),
      ],
    )
  }

  #[test]
  fn test_schedule_marks_passed() {
    let schedule = sample().schedule(at(13, 0));
    let passed: Vec<bool> = schedule.iter().map(|slot| slot.passed).collect();
    assert_eq!(passed, [true, true, false, false, false]);

    // exactly on time is not passed yet
    assert!(!sample().schedule(at(12, 1))[1].passed);
  }

  #[test]
  fn test_next_wraps_to_subuh() {
    assert_eq!(sample().next(at(13, 0)).salah, Salah::Ashar);
    assert_eq!(sample().next(at(3, 0)).salah, Salah::Subuh);

    let wrapped = sample().next(at(22, 0));
    assert_eq!(wrapped.salah, Salah::Subuh);
    assert!(!wrapped.passed);
  }

  #[test]
  fn test_parse_time() {
    assert_eq!(parse_time("04:35"), Some(at(4, 35)));
    assert_eq!(parse_time("19:20 (WIB)"), Some(at(19, 20)));
    assert_eq!(parse_time("soon"), None);
  }

  #[test]
  fn test_slot_serializes_clock() {
    let slot = sample().next(at(13, 0));
    let value = json::to_value(slot).unwrap();
    assert_eq!(value["salah"], "ashar");
    assert_eq!(value["time"], "15:14");
  }

  #[tokio::test]
  async fn test_timings_from_upstream() {
    async fn timings(Path(day): Path<String>) -> Json<json::Value> {
      assert_eq!(day, "01-03-2026");
      Json(json::json!({
        "code": 200,
        "data": { "timings": {
          "Fajr": "04:35 (WIB)", "Sunrise": "05:50", "Dhuhr": "12:01",
          "Asr": "15:14", "Maghrib": "18:10", "Isha": "19:20"
        }}
      }))
    }

    let router = Router::new().route("/v1/timingsByCity/{day}", get(timings));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let prayer = Prayer::new(format!("http://{addr}/v1/"), 20);
    let times = prayer
      .timings("Jakarta", "Indonesia", Date::from_ymd_opt(2026, 3, 1).unwrap())
      .await
      .unwrap();

    assert_eq!(times, sample());
    assert_eq!(times.time(Salah::Maghrib), Some(at(18, 10)));
  }
}
