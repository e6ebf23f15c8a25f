//! Engagement-weighted artist ranking.
//!
//! ## Scoring
//!
//! For every artist in the batch:
//! 1. `raw = plays + 2 × favorites + ln(track_count + 1) × 1000`
//! 2. The top ⌈20%⌉ of artists by `raw` are Pareto leaders.
//! 3. `points = raw / Σraw × multiplier × 10000`, with the multiplier
//!    [`LEADER_MULTIPLIER`] for leaders and [`TAIL_MULTIPLIER`] otherwise.
//!
//! The logarithmic breadth bonus keeps a single viral track from deciding
//! the ranking on play count alone.

use super::{group_by, sort_by_points, PopularityError, PopularityScore, TrackRecord, TOTAL_POINTS};
use serde::Serialize;
use tracing::info;

pub const LEADER_MULTIPLIER: f64 = 1.25;
pub const TAIL_MULTIPLIER: f64 = 0.75;
const LEADER_FRACTION: f64 = 0.2;
const BREADTH_BONUS: f64 = 1000.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ParetoMetrics {
    pub artist_count: usize,
    pub leader_count: usize,
    pub total_engagement: f64,
    /// Fraction of the total raw engagement held by the leaders.
    pub leader_share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRanking {
    pub scores: Vec<PopularityScore>,
    pub metrics: ParetoMetrics,
}

/// Number of leaders among `subjects` groups: ⌈20%⌉.
pub fn pareto_leader_count(subjects: usize) -> usize {
    (subjects as f64 * LEADER_FRACTION).ceil() as usize
}

pub fn raw_engagement(plays: u64, favorites: u64, track_count: usize) -> f64 {
    plays as f64 + 2.0 * favorites as f64 + ((track_count + 1) as f64).ln() * BREADTH_BONUS
}

pub fn rank_artists(tracks: &[TrackRecord]) -> Result<ArtistRanking, PopularityError> {
    if tracks.is_empty() {
        return Err(PopularityError::EmptyBatch);
    }

    let groups = group_by(tracks, |t| (t.user.id.clone(), t.user.name.clone()));
    let mut rated: Vec<(f64, _)> = groups
        .into_iter()
        .map(|(totals, _)| {
            let raw = raw_engagement(totals.total_plays, totals.total_favorites, totals.track_count);
            (raw, totals)
        })
        .collect();
    // Stable: equal engagement keeps first-seen order.
    rated.sort_by(|a, b| b.0.total_cmp(&a.0));

    let artist_count = rated.len();
    let leader_count = pareto_leader_count(artist_count);
    let total_engagement: f64 = rated.iter().map(|(raw, _)| raw).sum();
    let leader_engagement: f64 = rated.iter().take(leader_count).map(|(raw, _)| raw).sum();

    let mut scores: Vec<PopularityScore> = rated
        .into_iter()
        .enumerate()
        .map(|(rank, (raw, totals))| {
            let leader = rank < leader_count;
            let multiplier = if leader {
                LEADER_MULTIPLIER
            } else {
                TAIL_MULTIPLIER
            };
            let points = raw / total_engagement * multiplier * TOTAL_POINTS;
            totals.into_score(points, Some(leader))
        })
        .collect();
    sort_by_points(&mut scores);

    let metrics = ParetoMetrics {
        artist_count,
        leader_count,
        total_engagement,
        leader_share: leader_engagement / total_engagement,
    };
    info!(
        "Ranked {} artists from {} tracks, top {} hold {:.1}% of engagement",
        metrics.artist_count,
        tracks.len(),
        metrics.leader_count,
        metrics.leader_share * 100.0
    );

    Ok(ArtistRanking { scores, metrics })
}
