//! Weather tools against a mocked Open-Meteo archive.

use base64::Engine;
use serde_json::{json, Map, Value};
use std::time::Duration;
use vane::{Content, ErrorCode, ToolHandler};
use weathervane::openmeteo::ArchiveClient;
use weathervane::tools::{WeatherHandler, HISTORICAL_WEATHER, WEATHER_VISUALIZATION};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn paris(start: &str, end: &str) -> Map<String, Value> {
    args(json!({
        "latitude": 48.85,
        "longitude": 2.35,
        "start_date": start,
        "end_date": end
    }))
}

async fn handler_for(server: &MockServer) -> WeatherHandler {
    let archive = ArchiveClient::new(format!("{}/v1/archive", server.uri()), Duration::from_secs(5)).unwrap();
    WeatherHandler::new(archive)
}

fn daily(days: usize) -> Value {
    let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let time: Vec<String> = (0..days)
        .map(|i| (start + chrono::Duration::days(i as i64)).format("%Y-%m-%d").to_string())
        .collect();
    json!({
        "daily": {
            "time": time,
            "temperature_2m_mean": vec![11.5; days],
            "relative_humidity_2m_mean": vec![70; days],
            "weathercode": vec![3; days]
        }
    })
}

#[tokio::test]
async fn test_historical_weather_lines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .and(query_param("latitude", "48.85"))
        .and(query_param("start_date", "2024-03-01"))
        .and(query_param("end_date", "2024-03-02"))
        .and(query_param("timezone", "auto"))
        .and(query_param("daily", "temperature_2m_mean,relative_humidity_2m_mean,weathercode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "daily": {
                "time": ["2024-03-01", "2024-03-02"],
                "temperature_2m_mean": [7.4, 9.1],
                "relative_humidity_2m_mean": [81, 64],
                "weathercode": [61, 1]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler_for(&server).await;
    let output = handler
        .call_tool(HISTORICAL_WEATHER, paris("2024-03-01", "2024-03-02"))
        .await
        .unwrap();

    assert_eq!(
        output.joined_text(),
        "Date: 2024-03-01 | Temp: 7.4°C | Humidity: 81% | Cond: Rain\n\
         Date: 2024-03-02 | Temp: 9.1°C | Humidity: 64% | Cond: Cloudy"
    );
}

#[tokio::test]
async fn test_empty_archive_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"daily": {"time": []}})))
        .mount(&server)
        .await;

    let handler = handler_for(&server).await;

    let text = handler
        .call_tool(HISTORICAL_WEATHER, paris("2024-03-01", "2024-03-02"))
        .await
        .unwrap();
    assert_eq!(text.joined_text(), "No data.");

    let chart = handler
        .call_tool(WEATHER_VISUALIZATION, paris("2024-03-01", "2024-03-02"))
        .await
        .unwrap();
    assert_eq!(chart.content, vec![Content::text("No data.")]);
}

#[tokio::test]
async fn test_visualization_returns_svg_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily(14)))
        .mount(&server)
        .await;

    let handler = handler_for(&server).await;
    let output = handler
        .call_tool(WEATHER_VISUALIZATION, paris("2023-01-01", "2023-01-14"))
        .await
        .unwrap();

    match &output.content[..] {
        [Content::Image { data, mime_type }] => {
            assert_eq!(mime_type, "image/svg+xml");
            let svg = base64::engine::general_purpose::STANDARD.decode(data).unwrap();
            let svg = String::from_utf8(svg).unwrap();
            assert!(svg.contains("Daily View"));
            assert_eq!(svg.matches("fill-opacity=\"0.85\"").count(), 14);
        }
        other => panic!("expected one image, got {:?}", other),
    }
}

#[tokio::test]
async fn test_visualization_aggregates_long_ranges() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily(400)))
        .mount(&server)
        .await;

    let handler = handler_for(&server).await;
    let output = handler
        .call_tool(WEATHER_VISUALIZATION, paris("2023-01-01", "2024-02-04"))
        .await
        .unwrap();

    let Content::Image { data, .. } = &output.content[0] else {
        panic!("expected image");
    };
    let svg = String::from_utf8(base64::engine::general_purpose::STANDARD.decode(data).unwrap()).unwrap();
    assert!(svg.contains("Monthly Averages"));
    // Jan 2023 through Feb 2024
    assert_eq!(svg.matches("fill-opacity=\"0.85\"").count(), 14);
}

#[tokio::test]
async fn test_upstream_error_is_execution_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/archive"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": true,
            "reason": "Parameter 'start_date' is out of allowed range"
        })))
        .mount(&server)
        .await;

    let handler = handler_for(&server).await;
    let err = handler
        .call_tool(HISTORICAL_WEATHER, paris("1900-01-01", "1900-01-02"))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ExecutionFailed);
    assert!(err.message.contains("400"));
}

#[tokio::test]
async fn test_invalid_arguments_skip_the_archive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily(1)))
        .expect(0)
        .mount(&server)
        .await;

    let handler = handler_for(&server).await;
    let err = handler
        .call_tool(HISTORICAL_WEATHER, paris("2024-03-05", "2024-03-01"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArguments);

    let err = handler
        .call_tool(WEATHER_VISUALIZATION, args(json!({"latitude": 48.85})))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidArguments);
}

#[tokio::test]
async fn test_unknown_tool() {
    let server = MockServer::start().await;
    let handler = handler_for(&server).await;
    let err = handler.call_tool("get_forecast", Map::new()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownTool);
}
