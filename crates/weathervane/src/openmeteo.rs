//! Open-Meteo archive client.
//!
//! One request per tool call: daily mean temperature, mean relative humidity
//! and WMO code between two dates, in the location's own timezone.

use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const DAILY_FIELDS: &str = "temperature_2m_mean,relative_humidity_2m_mean,weathercode";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Archive returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Archive returned an invalid date: {0}")]
    InvalidDate(String),
}

/// Location and inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchiveQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One day of observations. Missing values stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub code: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    daily: Option<DailyColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct DailyColumns {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<f64>>,
}

impl DailyColumns {
    /// Zip the columns into rows, stopping at the shortest.
    fn into_records(self) -> Result<Vec<DailyRecord>, ArchiveError> {
        self.time
            .into_iter()
            .zip(self.temperature_2m_mean)
            .zip(self.relative_humidity_2m_mean)
            .zip(self.weathercode)
            .map(|(((time, temperature), humidity), code)| {
                let date = NaiveDate::parse_from_str(&time, "%Y-%m-%d")
                    .map_err(|_| ArchiveError::InvalidDate(time.clone()))?;
                Ok(DailyRecord {
                    date,
                    temperature,
                    humidity,
                    code: code.map(|c| c.round() as i64),
                })
            })
            .collect()
    }
}

/// HTTP client for the archive endpoint.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: reqwest::Client,
    url: String,
}

impl ArchiveClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ArchiveError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("weathervane/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch daily records for the query, oldest first.
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    pub async fn daily(&self, query: &ArchiveQuery) -> Result<Vec<DailyRecord>, ArchiveError> {
        let start = query.start.format("%Y-%m-%d").to_string();
        let end = query.end.format("%Y-%m-%d").to_string();

        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("latitude", query.latitude.to_string()),
                ("longitude", query.longitude.to_string()),
                ("start_date", start),
                ("end_date", end),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ArchiveResponse = response.json().await?;
        let records = parsed.daily.unwrap_or_default().into_records()?;

        tracing::debug!(days = records.len(), "Archive response");
        Ok(records)
    }
}
