//! WMO weather interpretation codes.

/// Short description for a daily `weathercode`.
pub fn describe(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1..=3 => "Cloudy",
        45..=48 => "Fog",
        51..=55 => "Drizzle",
        56..=57 => "Freezing Drizzle",
        61..=65 => "Rain",
        66..=67 => "Freezing Rain",
        71..=77 => "Snow",
        80..=82 => "Showers",
        85..=86 => "Snow Showers",
        95..=99 => "Storm",
        _ => "Unknown",
    }
}

/// Glyph drawn above a chart bar.
pub fn glyph(code: i64) -> &'static str {
    match code {
        0 => "\u{2600}",
        1 => "\u{26C5}",
        2..=3 => "\u{2601}",
        45..=48 => "\u{1F32B}",
        51..=57 => "\u{1F326}",
        61..=67 => "\u{1F327}",
        71..=77 => "\u{2744}",
        80..=82 => "\u{2614}",
        85..=86 => "\u{1F328}",
        95..=99 => "\u{26C8}",
        _ => "\u{1F321}",
    }
}

pub fn is_storm(code: i64) -> bool {
    (95..=99).contains(&code)
}

pub fn is_snow(code: i64) -> bool {
    (71..=77).contains(&code) || (85..=86).contains(&code)
}

/// Rain and showers, excluding drizzle.
pub fn is_heavy_rain(code: i64) -> bool {
    (61..=67).contains(&code) || (80..=82).contains(&code)
}

pub fn is_drizzle(code: i64) -> bool {
    (51..=57).contains(&code)
}

pub fn is_sunny(code: i64) -> bool {
    (0..=1).contains(&code)
}

pub fn is_cloudy(code: i64) -> bool {
    (2..=48).contains(&code)
}
