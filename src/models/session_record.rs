use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConsoleError;

/// One login/logout pair recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionRecord {
    /// Row id of the session entry.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "userId", default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "loginTime", deserialize_with = "timestamp")]
    pub login_time: DateTime<Utc>,
    #[serde(alias = "logoutTime", default, deserialize_with = "optional_timestamp")]
    pub logout_time: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_active(&self) -> bool {
        self.logout_time.is_none()
    }

    /// Undefined while the session is still active.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.logout_time.map(|logout| logout - self.login_time)
    }

    /// `hours : minutes`, the way the session history is displayed.
    pub fn duration_label(&self) -> Option<String> {
        self.duration().map(|d| {
            let minutes = d.num_minutes().max(0);
            format!("{} : {:02}", minutes / 60, minutes % 60)
        })
    }
}

/// Filters for the session history listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "fromDate", skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(rename = "toDate", skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
}

impl SessionQuery {
    pub fn validate_range(&self) -> Result<(), ConsoleError> {
        match (self.from_date, self.to_date) {
            (Some(from), Some(to)) if from > to => Err(ConsoleError::Validation(format!(
                "fromDate {from} is after toDate {to}"
            ))),
            _ => Ok(()),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}")))
}

fn optional_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}"))),
    }
}
