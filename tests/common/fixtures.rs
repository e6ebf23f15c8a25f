//! Payloads served by the fake discovery nodes

use super::constants::*;
use serde_json::{json, Value};

fn track(id: &str, title: &str, artist: &str, genre: &str, plays: u64, favorites: u64) -> Value {
    json!({
        "id": id,
        "title": title,
        "genre": genre,
        "play_count": plays,
        "favorite_count": favorites,
        "repost_count": 0,
        "user": {
            "id": format!("user-{}", artist.to_lowercase().replace(' ', "-")),
            "name": artist,
            "handle": artist.to_lowercase().replace(' ', ""),
        }
    })
}

/// Trending batch, ordered the way a node ranks it (by trending score, not plays)
pub fn trending_tracks() -> Value {
    json!([
        track("t1", TOP_TRACK_TITLE, LEADING_ARTIST, LEADING_GENRE, 90_000, 4_000),
        track("t2", SECOND_TRACK_TITLE, SECOND_ARTIST, LEADING_GENRE, 40_000, 1_500),
        track("t3", THIRD_TRACK_TITLE, THIRD_ARTIST, "Ambient", 12_000, 300),
        track("t4", "Cirrus", LEADING_ARTIST, LEADING_GENRE, 60_000, 2_500),
        track("t5", "Dive", THIRD_ARTIST, "Ambient", 8_000, 100),
    ])
}

/// Search results for any track query
pub fn search_tracks() -> Value {
    json!([
        track("s1", TOP_TRACK_TITLE, LEADING_ARTIST, LEADING_GENRE, 90_000, 4_000),
        track("s2", "Cirrus", LEADING_ARTIST, LEADING_GENRE, 60_000, 2_500),
    ])
}
