//! Monthly usage counters.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, account::UserId};

/// Calendar month key in `YYYY-MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
  year:  i32,
  month: u32,
}

impl MonthKey {
  pub fn of(at: DateTime<Utc>) -> Self {
    Self { year: at.year(), month: at.month() }
  }

  pub fn current() -> Self { Self::of(Utc::now()) }
}

impl fmt::Display for MonthKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

impl FromStr for MonthKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidMonth(s.to_owned());
    let (year, month) = s.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
      return Err(invalid());
    }
    Ok(Self { year, month })
  }
}

impl Serialize for MonthKey {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for MonthKey {
  fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let s = String::deserialize(d)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// Counters for one (user, month) pair. Both only ever increase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
  pub user_id:          UserId,
  pub month:            MonthKey,
  pub summary_count:    u32,
  pub competitor_count: u32,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn month_key_is_zero_padded() {
    let at = Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap();
    assert_eq!(MonthKey::of(at).to_string(), "2026-03");
  }

  #[test]
  fn month_boundary_changes_key() {
    let end = Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap();
    let start = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    assert_ne!(MonthKey::of(end), MonthKey::of(start));
    assert!(MonthKey::of(end) < MonthKey::of(start));
  }

  #[test]
  fn month_key_parse_rejects_garbage() {
    assert_eq!("2026-11".parse::<MonthKey>().unwrap().to_string(), "2026-11");
    assert!("2026-13".parse::<MonthKey>().is_err());
    assert!("november".parse::<MonthKey>().is_err());
  }
}
