//! SVG chart: temperature bars, humidity line, condition glyphs.

use base64::Engine;
use chrono::NaiveDate;
use std::fmt::Write;

use crate::aggregate::{Bucket, Resolution};
use crate::wmo;

pub const MIME_TYPE: &str = "image/svg+xml";

const HEIGHT: f64 = 720.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 80.0;
const MARGIN_TOP: f64 = 110.0;
const MARGIN_BOTTOM: f64 = 110.0;

const TEMP_COLOR: &str = "#FF9F43";
const HUMIDITY_COLOR: &str = "#0ABDE3";
const GRID_COLOR: &str = "#F0F0F0";
const TEXT_COLOR: &str = "#333333";

/// Humidity axis runs past 100 so the line clears the glyphs.
const HUMIDITY_AXIS_MAX: f64 = 125.0;

/// Everything the chart needs besides the data.
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec {
    pub resolution: Resolution,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Render the chart as an SVG document.
pub fn render_svg(spec: &ChartSpec, buckets: &[Bucket]) -> String {
    let width = (buckets.len() as f64 * 56.0).clamp(960.0, 1920.0);
    let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline_y = MARGIN_TOP + plot_h;

    let (t_min, t_max) = temperature_range(buckets);
    let temp_y = |t: f64| baseline_y - (t - t_min) / (t_max - t_min) * plot_h;
    let hum_y = |h: f64| baseline_y - h.clamp(0.0, HUMIDITY_AXIS_MAX) / HUMIDITY_AXIS_MAX * plot_h;

    let slot = plot_w / buckets.len().max(1) as f64;
    let bar_w = slot * bar_fraction(spec.resolution, buckets.len());
    let center_x = |i: usize| MARGIN_LEFT + slot * (i as f64 + 0.5);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="Helvetica, Arial, sans-serif">"#,
        w = width,
        h = HEIGHT
    );
    let _ = write!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    // Title
    let _ = write!(
        svg,
        r#"<text x="{x:.1}" y="44" text-anchor="middle" font-size="26" font-weight="bold" fill="{c}">Weather Analytics: {title}</text>"#,
        x = width / 2.0,
        c = TEXT_COLOR,
        title = escape(spec.resolution.title())
    );
    let _ = write!(
        svg,
        r#"<text x="{x:.1}" y="74" text-anchor="middle" font-size="16" fill="{c}">{start} to {end}</text>"#,
        x = width / 2.0,
        c = TEXT_COLOR,
        start = spec.start.format("%Y-%m-%d"),
        end = spec.end.format("%Y-%m-%d")
    );

    // Temperature grid and left axis
    let step = tick_step(t_min, t_max, 6);
    for tick in ticks(t_min, t_max, 6) {
        let y = temp_y(tick);
        let label = tick_label(tick, step);
        let _ = write!(
            svg,
            r#"<line x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="{g}" stroke-width="1.2"/><text x="{tx:.1}" y="{ty:.1}" text-anchor="end" font-size="13" fill="{c}">{label}</text>"#,
            x1 = MARGIN_LEFT,
            x2 = width - MARGIN_RIGHT,
            g = GRID_COLOR,
            tx = MARGIN_LEFT - 10.0,
            ty = y + 4.0,
            c = TEMP_COLOR,
        );
    }

    // Humidity right axis
    for tick in [0.0, 25.0, 50.0, 75.0, 100.0] {
        let _ = write!(
            svg,
            r#"<text x="{x:.1}" y="{y:.1}" font-size="13" fill="{c}">{tick}</text>"#,
            x = width - MARGIN_RIGHT + 10.0,
            y = hum_y(tick) + 4.0,
            c = HUMIDITY_COLOR,
        );
    }

    let _ = write!(
        svg,
        r#"<text transform="translate(24 {y:.1}) rotate(-90)" text-anchor="middle" font-size="15" font-weight="bold" fill="{c}">Temperature (°C)</text>"#,
        y = MARGIN_TOP + plot_h / 2.0,
        c = TEMP_COLOR
    );
    let _ = write!(
        svg,
        r#"<text transform="translate({x:.1} {y:.1}) rotate(90)" text-anchor="middle" font-size="15" font-weight="bold" fill="{c}">Humidity (%)</text>"#,
        x = width - 24.0,
        y = MARGIN_TOP + plot_h / 2.0,
        c = HUMIDITY_COLOR
    );

    // Bars and glyphs
    let zero_y = temp_y(0.0_f64.clamp(t_min, t_max));
    let glyph_offset = plot_h * 0.05;
    for (i, bucket) in buckets.iter().enumerate() {
        let x = center_x(i);
        if let Some(t) = bucket.temperature {
            let y = temp_y(t);
            let (top, height) = if y < zero_y { (y, zero_y - y) } else { (zero_y, y - zero_y) };
            let _ = write!(
                svg,
                r#"<rect x="{x:.1}" y="{top:.1}" width="{w:.1}" height="{height:.1}" fill="{c}" fill-opacity="0.85"><title>{label}: {t:.1}°C</title></rect>"#,
                x = x - bar_w / 2.0,
                w = bar_w,
                c = TEMP_COLOR,
                label = spec.resolution.label(bucket.start),
            );
        }
        if let Some(code) = bucket.code {
            let anchor = bucket.temperature.map(|t| t.max(0.0)).unwrap_or(0.0);
            let _ = write!(
                svg,
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" font-size="{s:.0}"><title>{d}</title>{g}</text>"#,
                y = temp_y(anchor.clamp(t_min, t_max)) - glyph_offset,
                s = (bar_w * 0.8).clamp(12.0, 28.0),
                d = wmo::describe(code),
                g = wmo::glyph(code),
            );
        }
    }

    // Humidity line with a soft shadow
    let points: Vec<String> = buckets
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.humidity.map(|h| format!("{:.1},{:.1}", center_x(i), hum_y(h))))
        .collect();
    if !points.is_empty() {
        let joined = points.join(" ");
        let _ = write!(
            svg,
            r#"<polyline points="{p}" fill="none" stroke="{c}" stroke-width="6" stroke-opacity="0.3"/><polyline points="{p}" fill="none" stroke="{c}" stroke-width="3" stroke-linejoin="round"/>"#,
            p = joined,
            c = HUMIDITY_COLOR
        );
    }

    // X labels, thinned so they never overlap
    let step = (buckets.len() as f64 * 64.0 / plot_w).ceil().max(1.0) as usize;
    for (i, bucket) in buckets.iter().enumerate().step_by(step) {
        let _ = write!(
            svg,
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" font-size="13" fill="{c}">{label}</text>"#,
            x = center_x(i),
            y = baseline_y + 24.0,
            c = TEXT_COLOR,
            label = escape(&spec.resolution.label(bucket.start)),
        );
    }
    let _ = write!(
        svg,
        r##"<line x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="#DDDDDD"/>"##,
        x1 = MARGIN_LEFT,
        x2 = width - MARGIN_RIGHT,
        y = baseline_y
    );

    // Legend
    let legend_y = HEIGHT - 36.0;
    let legend_x = width / 2.0 - 260.0;
    let _ = write!(
        svg,
        r#"<rect x="{x:.1}" y="{ry:.1}" width="18" height="14" fill="{tc}"/><text x="{tx:.1}" y="{y:.1}" font-size="14" fill="{c}">Temp Avg (°C)</text><line x1="{lx1:.1}" y1="{ly:.1}" x2="{lx2:.1}" y2="{ly:.1}" stroke="{hc}" stroke-width="3"/><text x="{htx:.1}" y="{y:.1}" font-size="14" fill="{c}">Humidity Avg (%)</text><text x="{gx:.1}" y="{y:.1}" font-size="14" fill="{c}">{g} Condition</text>"#,
        x = legend_x,
        ry = legend_y - 12.0,
        tc = TEMP_COLOR,
        tx = legend_x + 26.0,
        y = legend_y,
        c = TEXT_COLOR,
        lx1 = legend_x + 180.0,
        lx2 = legend_x + 204.0,
        ly = legend_y - 5.0,
        hc = HUMIDITY_COLOR,
        htx = legend_x + 212.0,
        gx = legend_x + 380.0,
        g = wmo::glyph(0),
    );

    svg.push_str("</svg>");
    svg
}

/// Render and base64-encode for an image content block.
pub fn render_base64(spec: &ChartSpec, buckets: &[Bucket]) -> String {
    base64::engine::general_purpose::STANDARD.encode(render_svg(spec, buckets))
}

fn bar_fraction(resolution: Resolution, count: usize) -> f64 {
    match resolution {
        Resolution::Daily => (30.0 / count.max(1) as f64).clamp(0.6, 0.9),
        Resolution::Weekly => 0.7,
        Resolution::Monthly => 0.8,
    }
}

/// Axis range covering zero and every temperature, with headroom for glyphs.
fn temperature_range(buckets: &[Bucket]) -> (f64, f64) {
    let (lo, hi) = buckets
        .iter()
        .filter_map(|b| b.temperature)
        .fold((0.0_f64, 0.0_f64), |(lo, hi), t| (lo.min(t), hi.max(t)));

    let span = (hi - lo).max(1.0);
    let lo = if lo < 0.0 { lo - span * 0.05 } else { 0.0 };
    (lo, hi + span * 0.2)
}

/// Round step giving about `target` ticks between `lo` and `hi`.
fn tick_step(lo: f64, hi: f64, target: usize) -> f64 {
    let raw = (hi - lo) / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(raw)
}

/// Round tick values between `lo` and `hi`.
fn ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    let step = tick_step(lo, hi, target);
    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last)
        .map(|i| {
            let tick = i as f64 * step;
            // Avoid "-0"
            if i == 0 { 0.0 } else { tick }
        })
        .collect()
}

/// Axis label with as many decimals as the step needs.
fn tick_label(tick: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10() - 1e-9).ceil().max(0.0) as usize
    };
    format!("{:.*}", decimals, tick)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
