//! Renders remote payloads and computed rankings as numbered text lists.

use crate::resolver::Route;
use serde_json::Value;

/// Never render more than this many records.
pub const MAX_RENDERED: usize = 10;

pub const NO_RESULTS: &str = "No results were found.";

/// Insert thousands separators: `1234567` → `1,234,567`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn heading(route: &Route) -> String {
    match route {
        Route::ArtistAggregate => "Top trending artists right now:".to_string(),
        Route::GenreAggregate => "Most popular genres right now:".to_string(),
        Route::CatalogCall(endpoint) => {
            let name = endpoint.api_name.trim_start_matches("Get ");
            format!("{}:", name)
        }
    }
}

/// Render `data` for `route`, showing at most `limit` (and never more than
/// [`MAX_RENDERED`]) records.
pub fn format_response(route: &Route, data: &Value, limit: Option<u64>) -> String {
    let records: Vec<&Value> = match data {
        Value::Array(items) => items.iter().collect(),
        Value::Null => vec![],
        other => vec![other],
    };
    if records.is_empty() {
        return NO_RESULTS.to_string();
    }

    let shown = limit
        .map(|l| (l as usize).min(MAX_RENDERED))
        .unwrap_or(MAX_RENDERED)
        .max(1);

    let mut lines = vec![heading(route)];
    for (i, record) in records.iter().take(shown).enumerate() {
        lines.push(format_record(i + 1, record));
    }
    lines.join("\n")
}

/// Render one record, dispatching on its shape.
pub fn format_record(position: usize, record: &Value) -> String {
    let obj = match record {
        Value::Object(obj) => obj,
        Value::String(s) => return format!("{}. {}", position, s),
        other => return format!("{}. {}", position, other),
    };

    if obj.contains_key("playlist_name") {
        format_playlist(position, record)
    } else if obj.contains_key("points") {
        format_ranked(position, record)
    } else if obj.contains_key("handle") && obj.contains_key("follower_count") {
        format_user(position, record)
    } else if obj.contains_key("title") {
        format_track(position, record)
    } else {
        format_generic(position, obj)
    }
}

fn text<'a>(record: &'a Value, pointer: &str) -> &'a str {
    record.pointer(pointer).and_then(Value::as_str).unwrap_or("Unknown")
}

fn count(record: &Value, pointer: &str) -> Option<u64> {
    let value = record.pointer(pointer)?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
}

fn format_track(position: usize, record: &Value) -> String {
    format!(
        "{}. \"{}\" by {} ({} plays)",
        position,
        text(record, "/title"),
        text(record, "/user/name"),
        format_number(count(record, "/play_count").unwrap_or(0))
    )
}

fn format_playlist(position: usize, record: &Value) -> String {
    let mut line = format!(
        "{}. \"{}\" by {}",
        position,
        text(record, "/playlist_name"),
        text(record, "/user/name")
    );
    let mut details = Vec::new();
    if let Some(tracks) = count(record, "/track_count") {
        details.push(format!("{} tracks", format_number(tracks)));
    }
    if let Some(plays) = count(record, "/total_play_count") {
        details.push(format!("{} plays", format_number(plays)));
    }
    if let Some(favorites) = count(record, "/favorite_count") {
        details.push(format!("{} favorites", format_number(favorites)));
    }
    if !details.is_empty() {
        line.push_str(&format!(" ({})", details.join(", ")));
    }
    line
}

fn format_user(position: usize, record: &Value) -> String {
    format!(
        "{}. {} (@{}) - {} followers, {} tracks",
        position,
        text(record, "/name"),
        text(record, "/handle"),
        format_number(count(record, "/follower_count").unwrap_or(0)),
        format_number(count(record, "/track_count").unwrap_or(0))
    )
}

fn format_ranked(position: usize, record: &Value) -> String {
    let mut line = format!(
        "{}. {} - {} points ({} tracks, {} plays, {} favorites)",
        position,
        text(record, "/subject_name"),
        format_number(count(record, "/points").unwrap_or(0)),
        format_number(count(record, "/track_count").unwrap_or(0)),
        format_number(count(record, "/total_plays").unwrap_or(0)),
        format_number(count(record, "/total_favorites").unwrap_or(0))
    );
    if record.pointer("/top_track/title").is_some() {
        line.push_str(&format!(
            ", top track \"{}\" ({} plays)",
            text(record, "/top_track/title"),
            format_number(count(record, "/top_track/plays").unwrap_or(0))
        ));
    }
    line
}

fn format_generic(position: usize, obj: &serde_json::Map<String, Value>) -> String {
    let fields: Vec<String> = obj
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some(format!("{}: {}", key, s)),
            Value::Number(n) => Some(format!("{}: {}", key, n)),
            _ => None,
        })
        .take(4)
        .collect();
    format!("{}. {}", position, fields.join(", "))
}
