//! Position-weighted genre ranking.
//!
//! Each track earns points from its chart position before grouping:
//! `TOTAL_POINTS / 5^(⌈position / 20⌉ - 1) / 20`, so the first 20 places
//! share the bulk and every further block of 20 earns a fifth of the one
//! before. Points are then summed per genre.

use super::{group_by, sort_by_points, PopularityError, PopularityScore, TrackRecord, TOTAL_POINTS};
use tracing::info;

pub const UNKNOWN_GENRE: &str = "Unknown";
const BLOCK_SIZE: usize = 20;
const DECAY: f64 = 5.0;

/// Points for a 1-based chart position.
pub fn position_points(position: usize) -> f64 {
    let block = position.div_ceil(BLOCK_SIZE).max(1) - 1;
    TOTAL_POINTS / DECAY.powi(block as i32) / BLOCK_SIZE as f64
}

fn genre_of(record: &TrackRecord) -> String {
    match record.genre.as_deref().map(str::trim) {
        Some(genre) if !genre.is_empty() => genre.to_string(),
        _ => UNKNOWN_GENRE.to_string(),
    }
}

/// Rank genres in a batch ordered by trending position.
pub fn rank_genres(tracks: &[TrackRecord]) -> Result<Vec<PopularityScore>, PopularityError> {
    if tracks.is_empty() {
        return Err(PopularityError::EmptyBatch);
    }

    let groups = group_by(tracks, |t| {
        let genre = genre_of(t);
        (genre.clone(), genre)
    });
    let mut scores: Vec<PopularityScore> = groups
        .into_iter()
        .map(|(totals, positions)| {
            let points = positions.iter().map(|p| position_points(p + 1)).sum();
            totals.into_score(points, None)
        })
        .collect();
    sort_by_points(&mut scores);

    info!(
        "Ranked {} genres from {} tracks",
        scores.len(),
        tracks.len()
    );
    Ok(scores)
}
