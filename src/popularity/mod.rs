//! Popularity rankings computed locally from a batch of trending tracks.
//!
//! Two calculators share the same output shape but rank differently:
//! - [`artist::rank_artists`] weighs engagement (plays, favorites and catalog
//!   breadth) and boosts the top 20% of artists.
//! - [`genre::rank_genres`] awards points by chart position, decaying
//!   geometrically every 20 places, and sums them per genre.

pub mod artist;
pub mod genre;

pub use artist::{pareto_leader_count, rank_artists, ArtistRanking, ParetoMetrics};
pub use genre::rank_genres;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Points distributed across all subjects of one ranking.
pub const TOTAL_POINTS: f64 = 10_000.0;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TrackArtist {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub handle: String,
}

/// The subset of a remote track record the calculators need.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrackRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub user: TrackArtist,
}

impl TrackRecord {
    /// Engagement used to pick a subject's top track.
    pub fn engagement(&self) -> u64 {
        self.play_count + 2 * self.favorite_count
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopTrack {
    pub title: String,
    pub plays: u64,
    pub favorites: u64,
}

impl TopTrack {
    fn from_record(record: &TrackRecord) -> Self {
        Self {
            title: record.title.clone(),
            plays: record.play_count,
            favorites: record.favorite_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PopularityScore {
    pub subject_name: String,
    pub subject_id: String,
    pub points: f64,
    pub track_count: usize,
    pub total_plays: u64,
    pub total_favorites: u64,
    pub top_track: TopTrack,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pareto_leader: Option<bool>,
}

#[derive(Debug, Error, PartialEq)]
pub enum PopularityError {
    #[error("the track batch is empty")]
    EmptyBatch,
}

/// Running totals for one subject while grouping a batch.
#[derive(Debug)]
struct SubjectTotals {
    name: String,
    id: String,
    track_count: usize,
    total_plays: u64,
    total_favorites: u64,
    top: TopTrack,
    top_engagement: u64,
}

impl SubjectTotals {
    fn new(name: String, id: String, first: &TrackRecord) -> Self {
        Self {
            name,
            id,
            track_count: 0,
            total_plays: 0,
            total_favorites: 0,
            top: TopTrack::from_record(first),
            top_engagement: first.engagement(),
        }
    }

    fn add(&mut self, record: &TrackRecord) {
        self.track_count += 1;
        self.total_plays += record.play_count;
        self.total_favorites += record.favorite_count;
        // Earlier tracks keep the spot on ties.
        if record.engagement() > self.top_engagement {
            self.top = TopTrack::from_record(record);
            self.top_engagement = record.engagement();
        }
    }

    fn into_score(self, points: f64, pareto_leader: Option<bool>) -> PopularityScore {
        PopularityScore {
            subject_name: self.name,
            subject_id: self.id,
            points,
            track_count: self.track_count,
            total_plays: self.total_plays,
            total_favorites: self.total_favorites,
            top_track: self.top,
            pareto_leader,
        }
    }
}

/// Group records by key, keeping first-seen order.
fn group_by<F>(tracks: &[TrackRecord], key: F) -> Vec<(SubjectTotals, Vec<usize>)>
where
    F: Fn(&TrackRecord) -> (String, String),
{
    let mut groups: Vec<(SubjectTotals, Vec<usize>)> = Vec::new();
    let mut index = std::collections::HashMap::new();
    for (position, record) in tracks.iter().enumerate() {
        let (id, name) = key(record);
        let slot = *index.entry(id.clone()).or_insert_with(|| {
            groups.push((SubjectTotals::new(name, id, record), Vec::new()));
            groups.len() - 1
        });
        groups[slot].0.add(record);
        groups[slot].1.push(position);
    }
    groups
}

fn sort_by_points(scores: &mut [PopularityScore]) {
    scores.sort_by(|a, b| b.points.total_cmp(&a.points));
}

#[cfg(test)]
pub(crate) fn track(id: &str, artist: &str, genre: Option<&str>, plays: u64, favorites: u64) -> TrackRecord {
    TrackRecord {
        id: id.to_string(),
        title: format!("Track {}", id),
        play_count: plays,
        favorite_count: favorites,
        genre: genre.map(str::to_string),
        user: TrackArtist {
            id: format!("id-{}", artist),
            name: artist.to_string(),
            handle: artist.to_lowercase(),
        },
    }
}
