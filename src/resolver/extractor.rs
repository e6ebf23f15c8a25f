//! Derive call arguments for a selected endpoint from the query text.

use super::classifier::Classification;
use super::lexicon;
use crate::catalog::EndpointDescriptor;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::debug;

pub const MAX_LIMIT: u64 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(u64),
    List(Vec<String>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => write!(f, "{}", s),
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

/// Parameter name → value, kept in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParameterBinding {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterBinding {
    pub fn new() -> ParameterBinding {
        ParameterBinding::default()
    }

    /// Bind `name`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> ParameterBinding {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> Option<u64> {
        match self.get("limit") {
            Some(ParamValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}

lazy_static! {
    static ref ID_MARKER_RE: Regex = Regex::new(r"(?i)\bids?\s*[:=]\s*([A-Za-z0-9_,-]+)")
        .expect("Invalid Regex, this should be fixed at compile time.");
    static ref ENTITY_ID_RE: Regex =
        Regex::new(r"(?i)\b(track|user|playlist|artist)\s+id\s+([A-Za-z0-9_-]+)")
            .expect("Invalid Regex, this should be fixed at compile time.");
    static ref WALLET_RE: Regex = Regex::new(r"\b0x[0-9a-fA-F]{40}\b")
        .expect("Invalid Regex, this should be fixed at compile time.");
    static ref OFFSET_RE: Regex = Regex::new(r"(?i)\b(?:offset|skip|skipping)\s+(\d+)")
        .expect("Invalid Regex, this should be fixed at compile time.");
}

/// Bind every declared parameter of `endpoint` that can be read from the
/// query. Unresolved optionals are omitted, unresolved required parameters
/// are left for the validator to report.
pub fn extract_parameters(
    query: &str,
    classification: &Classification,
    endpoint: &EndpointDescriptor,
) -> ParameterBinding {
    let tokens = lexicon::tokenize(&lexicon::normalize(query));
    let mut binding = ParameterBinding::new();

    for parameter in endpoint.all_parameters() {
        let name = parameter.name.as_str();
        let value = match name {
            "limit" => Some(ParamValue::Number(
                extract_limit(query).unwrap_or_else(|| endpoint.family().default_limit()),
            )),
            "offset" => extract_offset(query).map(ParamValue::Number),
            "query" => search_text(query, classification, &tokens).map(ParamValue::Text),
            "genre" => classification
                .genre
                .clone()
                .or_else(|| lexicon::canonical_genre(&tokens).map(str::to_string))
                .map(ParamValue::Text),
            "time" => lexicon::time_window(&tokens).map(|t| ParamValue::Text(t.to_string())),
            "associated_wallet" => WALLET_RE
                .find(query)
                .map(|m| ParamValue::Text(m.as_str().to_string())),
            "id" => {
                let ids = explicit_ids(query);
                (!ids.is_empty()).then_some(ParamValue::List(ids))
            }
            other if other.ends_with("_id") => {
                explicit_entity_id(query, other.trim_end_matches("_id")).map(ParamValue::Text)
            }
            _ => None,
        };

        match value {
            Some(value) => {
                debug!("Bound {} = {}", name, value);
                binding.insert(name, value);
            }
            None => debug!("Could not bind {} for {}", name, endpoint.api_name),
        }
    }
    binding
}

/// Requested result count: the first number outside quotes, named entities,
/// ids and offsets, capped at [`MAX_LIMIT`].
pub fn extract_limit(query: &str) -> Option<u64> {
    let mut text = lexicon::strip_quoted(query);
    if let Some(name) = lexicon::named_entity(query) {
        text = text.replacen(&name, " ", 1);
    }
    let text = ID_MARKER_RE.replace_all(&text, " ");
    let text = ENTITY_ID_RE.replace_all(&text, " ");
    let text = OFFSET_RE.replace_all(&text, " ");
    let tokens = lexicon::tokenize(&lexicon::normalize(&text));

    tokens
        .iter()
        .find_map(|t| {
            if t.chars().all(|c| c.is_ascii_digit()) {
                t.parse::<u64>().ok()
            } else {
                lexicon::number_word(t)
            }
        })
        .map(|n| n.clamp(1, MAX_LIMIT))
}

pub fn extract_offset(query: &str) -> Option<u64> {
    OFFSET_RE
        .captures(query)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn search_text(query: &str, classification: &Classification, tokens: &[String]) -> Option<String> {
    if let Some(name) = &classification.named_entity {
        return Some(name.clone());
    }
    if let Some(genre) = &classification.genre {
        return Some(genre.clone());
    }
    let residual = lexicon::residual_terms(tokens);
    if residual.is_empty() {
        debug!("No search terms left in {:?}", query);
        None
    } else {
        Some(residual.join(" "))
    }
}

fn explicit_ids(query: &str) -> Vec<String> {
    ID_MARKER_RE
        .captures_iter(query)
        .filter_map(|c| c.get(1))
        .flat_map(|m| m.as_str().split(','))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn explicit_entity_id(query: &str, entity: &str) -> Option<String> {
    let matches_entity = |found: &str| {
        found.eq_ignore_ascii_case(entity) || (entity == "user" && found.eq_ignore_ascii_case("artist"))
    };
    ENTITY_ID_RE
        .captures_iter(query)
        .find(|c| c.get(1).is_some_and(|m| matches_entity(m.as_str())))
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_string())
        .or_else(|| explicit_ids(query).into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::resolver::classifier::classify;

    fn extract(query: &str, endpoint: &str) -> ParameterBinding {
        let catalog = Catalog::builtin().unwrap();
        let endpoint = catalog.by_api_name(endpoint).unwrap();
        extract_parameters(query, &classify(query), endpoint)
    }

    #[test]
    fn limit_from_digits() {
        let b = extract("What are the top 3 trending tracks?", "Get Trending Tracks");
        assert_eq!(b.limit(), Some(3));
    }

    #[test]
    fn limit_from_number_word() {
        assert_eq!(extract_limit("give me five songs"), Some(5));
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(extract_limit("top 500 tracks"), Some(MAX_LIMIT));
    }

    #[test]
    fn limit_ignores_quoted_numbers() {
        assert_eq!(extract_limit("find 'Blink 182' tracks"), None);
        assert_eq!(extract_limit("find two tracks by 'Blink 182'"), Some(2));
    }

    #[test]
    fn limit_defaults_per_family() {
        assert_eq!(
            extract("trending tracks", "Get Trending Tracks").limit(),
            Some(3)
        );
        assert_eq!(
            extract("trending playlists", "Get Trending Playlists").limit(),
            Some(1)
        );
        assert_eq!(extract("find 'Bonobo'", "Search Users").limit(), Some(5));
        assert_eq!(
            extract("user id abc favorites", "Get User Favorites").limit(),
            Some(10)
        );
    }

    #[test]
    fn digits_in_artist_names_are_not_limits() {
        for q in [
            "find songs by 50 Cent",
            "find tracks by Blink 182",
            "search tracks from Sum 41",
            "find tracks by '2Pac'",
        ] {
            assert_eq!(extract(q, "Search Tracks").limit(), Some(5), "{}", q);
        }
        let b = extract("find songs by 50 Cent", "Search Tracks");
        assert_eq!(b.get("query"), Some(&ParamValue::Text("50 Cent".to_string())));
        assert_eq!(extract("top 3 songs by 50 Cent", "Search Tracks").limit(), Some(3));
    }

    #[test]
    fn quoted_name_becomes_query() {
        let b = extract("Find tracks by 'Bonobo'", "Search Tracks");
        assert_eq!(b.get("query"), Some(&ParamValue::Text("Bonobo".to_string())));
        assert_eq!(b.limit(), Some(5));
    }

    #[test]
    fn by_clause_becomes_query() {
        let b = extract("find songs by Four Tet", "Search Tracks");
        assert_eq!(b.get("query"), Some(&ParamValue::Text("Four Tet".to_string())));
    }

    #[test]
    fn genre_falls_back_as_query() {
        let b = extract("search deep house", "Search Tracks");
        assert_eq!(
            b.get("query"),
            Some(&ParamValue::Text("Deep House".to_string()))
        );
    }

    #[test]
    fn residual_words_become_query() {
        let b = extract("search for lofi beats", "Search Tracks");
        assert_eq!(b.get("query"), Some(&ParamValue::Text("lofi beats".to_string())));
    }

    #[test]
    fn trending_genre_and_time() {
        let b = extract("top 5 hip hop tracks this month", "Get Trending Tracks");
        assert_eq!(
            b.get("genre"),
            Some(&ParamValue::Text("Hip-Hop/Rap".to_string()))
        );
        assert_eq!(b.get("time"), Some(&ParamValue::Text("month".to_string())));
        assert_eq!(b.limit(), Some(5));
        assert!(!b.contains("offset"));
    }

    #[test]
    fn offset_is_read() {
        let b = extract("trending tracks skip 10", "Get Trending Tracks");
        assert_eq!(b.get("offset"), Some(&ParamValue::Number(10)));
        assert_eq!(b.limit(), Some(3));
    }

    #[test]
    fn entity_ids() {
        let b = extract("show playlist id x7Yz2", "Get Playlist");
        assert_eq!(b.get("playlist_id"), Some(&ParamValue::Text("x7Yz2".to_string())));

        let b = extract("favorites of user id:nlGNe", "Get User Favorites");
        assert_eq!(b.get("user_id"), Some(&ParamValue::Text("nlGNe".to_string())));
    }

    #[test]
    fn bulk_ids_are_a_list() {
        let b = extract("tracks ids: D7KyD,PjdWN", "Get Bulk Tracks");
        assert_eq!(
            b.get("id"),
            Some(&ParamValue::List(vec!["D7KyD".to_string(), "PjdWN".to_string()]))
        );
    }

    #[test]
    fn missing_required_stays_unbound() {
        let b = extract("what are my favorites", "Get User Favorites");
        assert!(!b.contains("user_id"));
    }

    #[test]
    fn binding_keeps_insertion_order_and_replaces() {
        let mut b = ParameterBinding::new()
            .with("b", ParamValue::Number(1))
            .with("a", ParamValue::Number(2));
        b.insert("b", ParamValue::Number(3));
        let names: Vec<&str> = b.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(b.get("b"), Some(&ParamValue::Number(3)));
    }
}
