//! Weather tools exposed over the vane transport.

use async_trait::async_trait;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use vane::{schema_for, Content, ToolDescriptor, ToolError, ToolHandler, ToolOutput};

use crate::aggregate;
use crate::chart::{self, ChartSpec};
use crate::openmeteo::{ArchiveClient, ArchiveQuery, DailyRecord};
use crate::wmo;

pub const HISTORICAL_WEATHER: &str = "get_historical_weather";
pub const WEATHER_VISUALIZATION: &str = "get_weather_visualization";

/// Reply when the archive has no days for the range.
pub const NO_DATA: &str = "No data.";

/// Arguments shared by both tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WeatherQuery {
    #[schemars(description = "Latitude in decimal degrees (-90 to 90)")]
    pub latitude: f64,

    #[schemars(description = "Longitude in decimal degrees (-180 to 180)")]
    pub longitude: f64,

    #[schemars(description = "First day, YYYY-MM-DD")]
    pub start_date: String,

    #[schemars(description = "Last day (inclusive), YYYY-MM-DD")]
    pub end_date: String,
}

impl WeatherQuery {
    pub fn from_arguments(arguments: Map<String, Value>) -> Result<Self, ToolError> {
        serde_json::from_value(Value::Object(arguments))
            .map_err(|e| ToolError::invalid_arguments(e.to_string()))
    }

    /// Check ranges and parse dates.
    pub fn validate(&self) -> Result<ArchiveQuery, ToolError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ToolError::invalid_arguments(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ToolError::invalid_arguments(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            )));
        }

        let start = parse_date("start_date", &self.start_date)?;
        let end = parse_date("end_date", &self.end_date)?;
        if start > end {
            return Err(ToolError::invalid_arguments(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }

        Ok(ArchiveQuery {
            latitude: self.latitude,
            longitude: self.longitude,
            start,
            end,
        })
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ToolError::invalid_arguments(format!("{} must be YYYY-MM-DD, got '{}'", field, value)))
}

/// Tool handler backed by the Open-Meteo archive.
pub struct WeatherHandler {
    archive: ArchiveClient,
}

impl WeatherHandler {
    pub fn new(archive: ArchiveClient) -> Self {
        Self { archive }
    }

    async fn fetch(&self, arguments: Map<String, Value>) -> Result<(ArchiveQuery, Vec<DailyRecord>), ToolError> {
        let query = WeatherQuery::from_arguments(arguments)?.validate()?;
        let records = self
            .archive
            .daily(&query)
            .await
            .map_err(|e| ToolError::execution_failed(e.to_string()))?;
        Ok((query, records))
    }

    async fn historical(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let (_, records) = self.fetch(arguments).await?;
        Ok(ToolOutput::text(format_days(&records)))
    }

    async fn visualization(&self, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let (query, records) = self.fetch(arguments).await?;
        if records.is_empty() {
            return Ok(ToolOutput::text(NO_DATA));
        }

        let (resolution, buckets) = aggregate::aggregate(&records);
        tracing::debug!(days = records.len(), buckets = buckets.len(), ?resolution, "Rendering chart");

        let spec = ChartSpec {
            resolution,
            start: query.start,
            end: query.end,
        };
        Ok(ToolOutput::new(vec![Content::image(
            chart::render_base64(&spec, &buckets),
            chart::MIME_TYPE,
        )]))
    }
}

#[async_trait]
impl ToolHandler for WeatherHandler {
    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(
                HISTORICAL_WEATHER,
                "Fetch daily historical weather (mean temperature, humidity, condition) as text.",
            )
            .with_schema(schema_for::<WeatherQuery>()),
            ToolDescriptor::new(
                WEATHER_VISUALIZATION,
                "Generate a chart of temperature and humidity with weather conditions. \
                 Daily up to 60 days, weekly up to a year, monthly beyond.",
            )
            .with_schema(schema_for::<WeatherQuery>()),
        ]
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        match name {
            HISTORICAL_WEATHER => self.historical(arguments).await,
            WEATHER_VISUALIZATION => self.visualization(arguments).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

/// One line per day, or `No data.`.
pub fn format_days(records: &[DailyRecord]) -> String {
    if records.is_empty() {
        return NO_DATA.to_string();
    }

    records
        .iter()
        .map(|r| {
            format!(
                "Date: {} | Temp: {}°C | Humidity: {}% | Cond: {}",
                r.date.format("%Y-%m-%d"),
                r.temperature.map(|t| format!("{:.1}", t)).unwrap_or_else(|| "n/a".into()),
                r.humidity.map(|h| format!("{:.0}", h)).unwrap_or_else(|| "n/a".into()),
                r.code.map(wmo::describe).unwrap_or("Unknown"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
