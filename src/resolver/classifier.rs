//! Lexical intent classification.

use super::lexicon;
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Trending,
    Search,
    Genre,
    User,
    Playlist,
    General,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Track,
    User,
    Playlist,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub query_type: QueryType,
    pub entity_type: Option<EntityType>,
    pub complexity: Complexity,
    /// Catalog category names used to shortlist candidate endpoints.
    pub categories: Vec<String>,
    pub named_entity: Option<String>,
    pub mentions_genre: bool,
    /// Canonical genre named by the query, if any.
    pub genre: Option<String>,
}

impl Classification {
    fn general() -> Classification {
        Classification {
            query_type: QueryType::General,
            entity_type: None,
            complexity: Complexity::Simple,
            categories: vec![],
            named_entity: None,
            mentions_genre: false,
            genre: None,
        }
    }

    pub fn is_general(&self) -> bool {
        self.query_type == QueryType::General
    }
}

/// Categories in tie-break priority order.
const CATEGORY_TRIGGERS: &[(QueryType, &[&str])] = &[
    (QueryType::Trending, lexicon::TRENDING_TRIGGERS),
    (QueryType::Search, lexicon::SEARCH_TRIGGERS),
    (QueryType::Genre, lexicon::GENRE_TRIGGERS),
    (QueryType::User, lexicon::USER_TRIGGERS),
    (QueryType::Playlist, lexicon::PLAYLIST_TRIGGERS),
];

const ENTITY_WORDS: &[(EntityType, &[&str])] = &[
    (EntityType::Track, lexicon::TRACK_WORDS),
    (EntityType::User, lexicon::USER_WORDS),
    (EntityType::Playlist, lexicon::PLAYLIST_WORDS),
];

/// Classify a raw query. Never fails: anything outside the music domain,
/// or without any recognizable trigger, comes back as `General`.
pub fn classify(query: &str) -> Classification {
    let normalized = lexicon::normalize(query);
    let tokens = lexicon::tokenize(&normalized);

    if !lexicon::has_domain_keyword(&tokens) {
        debug!("No domain keyword in {:?}, classifying as general", query);
        return Classification::general();
    }

    let genre = lexicon::canonical_genre(&tokens);
    let mentions_genre = genre.is_some() || lexicon::count_matches(&tokens, lexicon::GENRE_TRIGGERS) > 0;
    let named_entity = lexicon::named_entity(query);
    let detected_entity = detect_entity(&tokens);

    let query_type = match winning_category(&tokens, genre.is_some()) {
        Some(t) => t,
        None => {
            let fallback = match detected_entity {
                Some(EntityType::Track) => QueryType::Search,
                Some(EntityType::User) => QueryType::User,
                Some(EntityType::Playlist) => QueryType::Playlist,
                None => QueryType::General,
            };
            debug!(
                "No category trigger in {:?}, defaulting to {:?}",
                query, fallback
            );
            fallback
        }
    };

    // Tracks are what trending means unless something specific is named.
    let entity_type = match (query_type, detected_entity, &named_entity) {
        (QueryType::Trending, Some(EntityType::Track), None) => None,
        (_, entity, _) => entity,
    };

    let classification = Classification {
        query_type,
        entity_type,
        complexity: complexity(&tokens),
        categories: categories_for(query_type, entity_type),
        named_entity,
        mentions_genre,
        genre: genre.map(str::to_string),
    };
    debug!("Classified {:?} as {:?}", query, classification);
    classification
}

fn winning_category(tokens: &[String], has_concrete_genre: bool) -> Option<QueryType> {
    let mut best: Option<(QueryType, usize)> = None;
    for (query_type, triggers) in CATEGORY_TRIGGERS {
        let mut count = lexicon::count_matches(tokens, triggers);
        if *query_type == QueryType::Genre && has_concrete_genre {
            count += 1;
        }
        if count == 0 {
            continue;
        }
        match best {
            Some((winner, best_count)) if best_count >= count => {
                if best_count == count {
                    debug!(
                        "Ambiguous classification, {:?} ties with {:?} at {}; keeping {:?}",
                        query_type, winner, count, winner
                    );
                }
            }
            _ => best = Some((*query_type, count)),
        }
    }
    best.map(|(t, _)| t)
}

fn detect_entity(tokens: &[String]) -> Option<EntityType> {
    let mut best: Option<(EntityType, usize)> = None;
    for (entity, words) in ENTITY_WORDS {
        let count = lexicon::count_matches(tokens, words);
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((*entity, count)),
        }
    }
    best.map(|(e, _)| e)
}

fn complexity(tokens: &[String]) -> Complexity {
    let conjunctions = tokens.iter().filter(|t| lexicon::is_conjunction(t)).count();
    let content = tokens
        .iter()
        .filter(|t| !lexicon::is_stopword(t) && !lexicon::is_conjunction(t))
        .count();
    if content > 10 || conjunctions > 2 {
        Complexity::Complex
    } else if content > 5 || conjunctions > 1 {
        Complexity::Moderate
    } else {
        Complexity::Simple
    }
}

fn categories_for(query_type: QueryType, entity: Option<EntityType>) -> Vec<String> {
    let names: &[&str] = match (entity, query_type) {
        (Some(EntityType::Track), _) => &["Tracks"],
        (Some(EntityType::User), _) => &["Users"],
        (Some(EntityType::Playlist), _) => &["Playlists"],
        (None, QueryType::Trending) => &["Tracks", "Playlists"],
        (None, QueryType::Search) => &["Tracks", "Users", "Playlists"],
        (None, QueryType::Genre) => &["Tracks"],
        (None, QueryType::User) => &["Users"],
        (None, QueryType::Playlist) => &["Playlists"],
        (None, QueryType::General) => &[],
    };
    names.iter().map(|s| s.to_string()).collect()
}
