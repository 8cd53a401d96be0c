//! weathervane - historical weather tools over a dual-endpoint SSE transport
//!
//! - `wmo`: weather code descriptions and categories
//! - `openmeteo`: archive client
//! - `aggregate`: daily, weekly and monthly bucketing
//! - `chart`: SVG rendering
//! - `tools`: the `ToolHandler` the transport dispatches to
//! - `serve`: bind and run
//! - `telemetry`: tracing and optional OTLP export

pub mod aggregate;
pub mod chart;
pub mod openmeteo;
pub mod serve;
pub mod telemetry;
pub mod tools;
pub mod wmo;

pub use tools::WeatherHandler;
