//! Endpoint selection: aggregate routing, exact routes and weighted scoring.

use super::classifier::{Classification, EntityType, QueryType};
use super::error::ResolveError;
use super::lexicon;
use crate::catalog::{Catalog, EndpointDescriptor};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Where a query is served from, decided once per query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Route<'a> {
    CatalogCall(&'a EndpointDescriptor),
    ArtistAggregate,
    GenreAggregate,
}

impl<'a> Route<'a> {
    pub fn label(&self) -> RouteLabel {
        match self {
            Route::CatalogCall(endpoint) => RouteLabel::CatalogCall {
                endpoint: endpoint.api_name.clone(),
            },
            Route::ArtistAggregate => RouteLabel::ArtistAggregate,
            Route::GenreAggregate => RouteLabel::GenreAggregate,
        }
    }

    /// Short name used as a metrics label.
    pub fn metric_name(&self) -> &str {
        match self {
            Route::CatalogCall(endpoint) => &endpoint.tool_name,
            Route::ArtistAggregate => "artist_aggregate",
            Route::GenreAggregate => "genre_aggregate",
        }
    }
}

/// Owned, serializable view of a [`Route`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteLabel {
    CatalogCall { endpoint: String },
    ArtistAggregate,
    GenreAggregate,
}

/// A query type (and optional entity) that always maps to one endpoint.
#[derive(Clone, Debug)]
pub struct ExactRoute {
    pub query_type: QueryType,
    /// `None` matches a classification without an entity.
    pub entity: Option<EntityType>,
    pub endpoint: String,
}

#[derive(Clone, Debug)]
pub struct WeightedPattern {
    pub pattern: Regex,
    pub endpoints: Vec<String>,
    pub weight: u32,
}

/// Literal heuristics used by the scorer.
#[derive(Clone, Debug)]
pub struct ScoringTables {
    pub exact_routes: Vec<ExactRoute>,
    /// Query token → endpoints that get +`keyword_hit` when it appears.
    pub keyword_endpoints: Vec<(String, Vec<String>)>,
    /// Query token → weight added when the endpoint name contains it.
    pub keyword_weights: Vec<(String, u32)>,
    pub patterns: Vec<WeightedPattern>,
    pub keyword_hit: u32,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn pattern(re: &str, endpoints: &[&str], weight: u32) -> WeightedPattern {
    WeightedPattern {
        pattern: Regex::new(re).expect("Invalid Regex, this should be fixed at compile time."),
        endpoints: owned(endpoints),
        weight,
    }
}

impl Default for ScoringTables {
    fn default() -> Self {
        let trending: &[&str] = &["Get Trending Tracks", "Get Trending Playlists"];
        let search: &[&str] = &["Search Tracks", "Search Users", "Search Playlists"];
        let user: &[&str] = &["Get User", "Search Users"];
        let playlist: &[&str] = &["Get Playlist", "Search Playlists"];
        let track: &[&str] = &["Get Track", "Search Tracks"];

        let keyword_endpoints: [(&str, &[&str]); 11] = [
            ("trending", trending),
            ("popular", trending),
            ("search", search),
            ("find", search),
            ("user", user),
            ("users", user),
            ("playlist", playlist),
            ("playlists", playlist),
            ("track", track),
            ("tracks", track),
            ("genre", &["Search Tracks"]),
        ];
        let keyword_endpoints = keyword_endpoints
            .iter()
            .map(|(k, v)| (k.to_string(), owned(v)))
            .collect();

        let keyword_weights = [
            ("trending", 15),
            ("popular", 12),
            ("search", 10),
            ("find", 8),
            ("user", 5),
            ("users", 5),
            ("playlist", 5),
            ("playlists", 5),
            ("track", 5),
            ("tracks", 5),
        ]
        .iter()
        .map(|(k, w)| (k.to_string(), *w))
        .collect();

        ScoringTables {
            exact_routes: vec![
                ExactRoute {
                    query_type: QueryType::Trending,
                    entity: None,
                    endpoint: "Get Trending Tracks".to_string(),
                },
                ExactRoute {
                    query_type: QueryType::Trending,
                    entity: Some(EntityType::Track),
                    endpoint: "Get Trending Tracks".to_string(),
                },
                ExactRoute {
                    query_type: QueryType::Trending,
                    entity: Some(EntityType::Playlist),
                    endpoint: "Get Trending Playlists".to_string(),
                },
            ],
            keyword_endpoints,
            keyword_weights,
            patterns: vec![
                pattern(r"trend(ing)?|popular", trending, 15),
                pattern(r"search|find", search, 10),
                pattern(r"user|artist", user, 5),
                pattern(r"playlist", playlist, 5),
                pattern(r"track|song", track, 5),
                pattern(r"genre|style", &["Search Tracks"], 15),
            ],
            keyword_hit: 5,
        }
    }
}

/// Relevance of one endpoint for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore<'a> {
    pub endpoint: &'a EndpointDescriptor,
    pub score: u32,
}

pub fn score_endpoint(
    tables: &ScoringTables,
    endpoint: &EndpointDescriptor,
    tokens: &[String],
    text: &str,
) -> u32 {
    let api_name = endpoint.api_name.as_str();
    let lower_name = api_name.to_lowercase();
    let mut score = 0;

    for token in tokens {
        if let Some((_, endpoints)) = tables.keyword_endpoints.iter().find(|(k, _)| k == token) {
            if endpoints.iter().any(|e| e == api_name) {
                score += tables.keyword_hit;
            }
        }
        if let Some((keyword, weight)) = tables.keyword_weights.iter().find(|(k, _)| k == token) {
            if lower_name.contains(keyword.as_str()) {
                score += weight;
            }
        }
    }

    for p in &tables.patterns {
        if p.pattern.is_match(text) && p.endpoints.iter().any(|e| e == api_name) {
            score += p.weight;
        }
    }
    score
}

/// Score every shortlisted endpoint, in catalog declaration order.
pub fn score_candidates<'a>(
    tables: &ScoringTables,
    catalog: &'a Catalog,
    classification: &Classification,
    query: &str,
) -> Vec<CandidateScore<'a>> {
    let text = lexicon::normalize(query);
    let tokens = lexicon::tokenize(&text);
    catalog
        .in_categories(&classification.categories)
        .into_iter()
        .map(|endpoint| CandidateScore {
            endpoint,
            score: score_endpoint(tables, endpoint, &tokens, &text),
        })
        .collect()
}

/// Pick the route for a classified query.
pub fn select_route<'a>(
    tables: &ScoringTables,
    catalog: &'a Catalog,
    classification: &Classification,
    query: &str,
) -> Result<Route<'a>, ResolveError> {
    if classification.is_general() {
        return Err(ResolveError::UnsupportedQuery);
    }

    let tokens = lexicon::tokenize(&lexicon::normalize(query));
    let popularity_trigger = lexicon::count_matches(&tokens, lexicon::TRENDING_TRIGGERS) > 0;
    let has_name = classification.named_entity.is_some();

    if popularity_trigger && !has_name {
        if classification.mentions_genre && classification.genre.is_none() {
            debug!("Routing {:?} to the genre aggregate", query);
            return Ok(Route::GenreAggregate);
        }
        if classification.entity_type == Some(EntityType::User) {
            debug!("Routing {:?} to the artist aggregate", query);
            return Ok(Route::ArtistAggregate);
        }
    }

    if !has_name {
        let exact = tables.exact_routes.iter().find(|r| {
            r.query_type == classification.query_type && r.entity == classification.entity_type
        });
        if let Some(endpoint) = exact.and_then(|r| catalog.by_api_name(&r.endpoint)) {
            debug!("Exact route {} for {:?}", endpoint.api_name, query);
            return Ok(Route::CatalogCall(endpoint));
        }
    }

    let mut best: Option<CandidateScore> = None;
    for candidate in score_candidates(tables, catalog, classification, query) {
        debug!(
            "Relevance score for {}: {}",
            candidate.endpoint.api_name, candidate.score
        );
        match best {
            Some(b) if b.score >= candidate.score => {}
            _ => best = Some(candidate),
        }
    }

    match best {
        Some(b) if b.score > 0 => Ok(Route::CatalogCall(b.endpoint)),
        _ => Err(ResolveError::NoSuitableEndpoint),
    }
}
