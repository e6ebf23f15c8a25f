//! Word lists and small text helpers shared by the classifier, the selector
//! and the parameter extractor.
//!
//! All matching is done on normalized text (lower-cased, contractions
//! expanded) split into tokens. Multi-word phrases match as contiguous
//! token runs, so "rap" never matches inside "trap".

use lazy_static::lazy_static;
use regex::Regex;

// ============================================================================
// Trigger tables
// ============================================================================

pub const TRENDING_TRIGGERS: &[&str] = &[
    "trending",
    "trend",
    "trends",
    "popular",
    "popularity",
    "hot",
    "hottest",
    "top",
    "charts",
    "chart",
    "charting",
    "viral",
    "most played",
    "best",
];

pub const SEARCH_TRIGGERS: &[&str] = &[
    "search",
    "find",
    "look up",
    "lookup",
    "looking for",
    "locate",
];

pub const GENRE_TRIGGERS: &[&str] = &["genre", "genres", "style", "styles"];

pub const USER_TRIGGERS: &[&str] = &[
    "user",
    "users",
    "artist",
    "artists",
    "profile",
    "profiles",
    "producer",
    "producers",
    "musician",
    "musicians",
    "dj",
    "djs",
    "creator",
    "creators",
    "followers",
];

pub const PLAYLIST_TRIGGERS: &[&str] = &[
    "playlist",
    "playlists",
    "album",
    "albums",
    "mixtape",
    "mixtapes",
    "compilation",
];

pub const TRACK_WORDS: &[&str] = &["track", "tracks", "song", "songs", "tune", "tunes", "single", "singles"];

pub const USER_WORDS: &[&str] = &[
    "user",
    "users",
    "artist",
    "artists",
    "producer",
    "producers",
    "musician",
    "musicians",
    "dj",
    "djs",
    "creator",
    "creators",
    "profile",
];

pub const PLAYLIST_WORDS: &[&str] = &["playlist", "playlists", "album", "albums", "mixtape", "mixtapes"];

/// Words that mark a query as being about the music network. Category
/// triggers ("top", "find", "style") are ordinary English and never count.
const DOMAIN_WORDS: &[&str] = &[
    "audius",
    "music",
    "musical",
    "musician",
    "musicians",
    "song",
    "songs",
    "track",
    "tracks",
    "artist",
    "artists",
    "producer",
    "producers",
    "singer",
    "singers",
    "rapper",
    "rappers",
    "band",
    "bands",
    "dj",
    "djs",
    "user",
    "users",
    "playlist",
    "playlists",
    "album",
    "albums",
    "mixtape",
    "mixtapes",
    "remix",
    "remixes",
    "genre",
    "genres",
    "streaming",
    "plays",
    "played",
    "listen",
    "listens",
    "listening",
    "listener",
    "listeners",
    "favorites",
    "reposts",
];

/// Genre aliases that are too common in everyday speech to mark a query as
/// musical on their own.
const AMBIGUOUS_GENRE_ALIASES: &[&str] = &[
    "world",
    "international",
    "alternative",
    "alt",
    "indie",
    "house",
    "rock",
    "soul",
    "trap",
    "jungle",
    "orchestra",
    "atmospheric",
];

pub const CONJUNCTIONS: &[&str] = &["and", "or"];

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "what", "which", "who", "whom", "me",
    "show", "give", "tell", "list", "get", "of", "on", "in", "at", "for", "to", "i", "you",
    "we", "my", "your", "please", "can", "could", "would", "will", "do", "does", "did",
    "right", "now", "currently", "current", "some", "any", "there", "this", "that", "these",
    "those", "with", "about", "it", "its", "let", "us", "how", "many", "much", "s",
];

const NUMBER_WORDS: &[(&str, u64)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

const CONTRACTIONS: &[(&str, &str)] = &[
    ("what's", "what is"),
    ("who's", "who is"),
    ("where's", "where is"),
    ("how's", "how is"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("i'd", "i would"),
    ("you're", "you are"),
    ("they're", "they are"),
    ("what're", "what are"),
    ("can't", "cannot"),
    ("won't", "will not"),
    ("don't", "do not"),
    ("doesn't", "does not"),
    ("isn't", "is not"),
    ("aren't", "are not"),
];

// ============================================================================
// Genre aliases
// ============================================================================

/// Canonical genre and its aliases. Entries are ordered so that more specific
/// aliases are tried before the shorter ones they contain ("deep house" before
/// "house", "indie rock" before "indie").
pub const GENRE_ALIASES: &[(&str, &[&str])] = &[
    ("Deep House", &["deep house"]),
    ("Tech House", &["tech house"]),
    (
        "Drum & Bass",
        &["drum and bass", "drum & bass", "drum n bass", "dnb", "d&b", "jungle"],
    ),
    ("R&B/Soul", &["rhythm and blues", "r&b", "rnb", "soul"]),
    ("Rock", &["alternative rock", "indie rock", "rock"]),
    ("Hip-Hop/Rap", &["hip hop", "hip-hop", "hiphop", "rap"]),
    ("Electronic", &["electronic", "electronica", "edm"]),
    ("Pop", &["pop"]),
    ("Jazz", &["jazz", "jazzy"]),
    ("House", &["house"]),
    ("Techno", &["techno"]),
    ("Trap", &["trap"]),
    ("Dubstep", &["dubstep"]),
    ("Alternative", &["alternative", "alt", "indie"]),
    ("Classical", &["classical", "orchestra", "orchestral"]),
    ("Ambient", &["ambient", "atmospheric"]),
    ("World", &["world music", "world", "international"]),
];

/// Time-window phrases and the value the trending endpoints expect.
pub const TIME_WINDOWS: &[(&str, &str)] = &[
    ("all time", "allTime"),
    ("all-time", "allTime"),
    ("alltime", "allTime"),
    ("this week", "week"),
    ("past week", "week"),
    ("last week", "week"),
    ("weekly", "week"),
    ("this month", "month"),
    ("past month", "month"),
    ("last month", "month"),
    ("monthly", "month"),
    ("this year", "year"),
    ("past year", "year"),
    ("last year", "year"),
    ("yearly", "year"),
];

/// Words that end a "by <name>" / "from <name>" clause.
const CLAUSE_TERMINATORS: &[&str] = &[
    "this", "that", "on", "in", "with", "for", "right", "today", "last", "past", "during",
    "sorted", "ordered", "please", "of", "ever",
];

/// Phrases after "by" that describe an ordering rather than a name.
const RANKING_WORDS: &[&str] = &[
    "plays",
    "play",
    "popularity",
    "favorites",
    "followers",
    "reposts",
    "genre",
    "count",
    "date",
];

lazy_static! {
    static ref QUOTED_RE: Regex = Regex::new(r#"(?:^|\s)["'“‘]([^"“”]+?)["'”’](?:$|[\s?.!,;:])"#)
        .expect("Invalid Regex, this should be fixed at compile time.");
    static ref BY_RE: Regex =
        Regex::new(r"(?i)\bby\s+(.+)").expect("Invalid Regex, this should be fixed at compile time.");
    static ref FROM_RE: Regex =
        Regex::new(r"(?i)\bfrom\s+(.+)").expect("Invalid Regex, this should be fixed at compile time.");
}

// ============================================================================
// Normalization and tokens
// ============================================================================

/// Lower-case the query, unify apostrophes and expand common contractions.
pub fn normalize(query: &str) -> String {
    let lowered = query.to_lowercase().replace(['’', '‘'], "'");
    lowered
        .split_whitespace()
        .map(|word| {
            let bare = word.trim_end_matches(|c: char| c.is_ascii_punctuation() && c != '\'');
            let tail = &word[bare.len()..];
            match CONTRACTIONS.iter().find(|(short, _)| *short == bare) {
                Some((_, long)) => format!("{}{}", long, tail),
                None => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split normalized text into tokens. Letters, digits, `&` and inner `-`
/// are token characters, everything else separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '&' || c == '-'))
        .map(|t| t.trim_matches('-'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Number of non-overlapping occurrences of `phrase` as a token run.
pub fn phrase_count(tokens: &[String], phrase: &str) -> usize {
    let needle = tokenize(phrase);
    if needle.is_empty() || needle.len() > tokens.len() {
        return 0;
    }
    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= tokens.len() {
        if tokens[i..i + needle.len()]
            .iter()
            .zip(needle.iter())
            .all(|(a, b)| a == b)
        {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

pub fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    phrase_count(tokens, phrase) > 0
}

pub fn count_matches(tokens: &[String], phrases: &[&str]) -> usize {
    phrases.iter().map(|p| phrase_count(tokens, p)).sum()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

pub fn is_conjunction(token: &str) -> bool {
    CONJUNCTIONS.contains(&token)
}

pub fn number_word(token: &str) -> Option<u64> {
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == token)
        .map(|(_, n)| *n)
}

/// True when any token belongs to the music-network vocabulary: a domain
/// word or an unambiguous genre alias.
pub fn has_domain_keyword(tokens: &[String]) -> bool {
    count_matches(tokens, DOMAIN_WORDS) > 0
        || GENRE_ALIASES
            .iter()
            .flat_map(|(_, aliases)| aliases.iter().copied())
            .filter(|alias| !AMBIGUOUS_GENRE_ALIASES.contains(alias))
            .any(|alias| contains_phrase(tokens, alias))
}

/// Connectives that glue a name or search phrase to the rest of a query.
const CONNECTIVES: &[&str] = &["by", "from", "called", "named", "like", "up", "looking"];

fn is_vocabulary(token: &str) -> bool {
    let tables: [&[&str]; 8] = [
        TRENDING_TRIGGERS,
        SEARCH_TRIGGERS,
        GENRE_TRIGGERS,
        USER_TRIGGERS,
        PLAYLIST_TRIGGERS,
        TRACK_WORDS,
        USER_WORDS,
        PLAYLIST_WORDS,
    ];
    tables
        .iter()
        .flat_map(|t| t.iter())
        .any(|entry| *entry == token)
}

/// Content words left once stopwords, numbers and the category vocabulary
/// are removed. Used as free-text search terms.
pub fn residual_terms(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| {
            !is_stopword(t)
                && !is_conjunction(t)
                && !is_vocabulary(t)
                && !CONNECTIVES.contains(&t.as_str())
                && number_word(t).is_none()
                && !t.chars().all(|c| c.is_ascii_digit())
        })
        .cloned()
        .collect()
}

/// First canonical genre whose alias appears in the tokens.
pub fn canonical_genre(tokens: &[String]) -> Option<&'static str> {
    GENRE_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| contains_phrase(tokens, a)))
        .map(|(canonical, _)| *canonical)
}

pub fn time_window(tokens: &[String]) -> Option<&'static str> {
    TIME_WINDOWS
        .iter()
        .find(|(phrase, _)| contains_phrase(tokens, phrase))
        .map(|(_, value)| *value)
}

// ============================================================================
// Named entities
// ============================================================================

/// A concrete name mentioned by the query: quoted text first, then a
/// "by <name>" clause, then a "from <name>" clause. Case is preserved.
pub fn named_entity(raw: &str) -> Option<String> {
    quoted_text(raw)
        .or_else(|| clause_name(&BY_RE, raw))
        .or_else(|| clause_name(&FROM_RE, raw))
}

pub fn quoted_text(raw: &str) -> Option<String> {
    QUOTED_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The query with every quoted span removed.
pub fn strip_quoted(raw: &str) -> String {
    QUOTED_RE.replace_all(raw, " ").into_owned()
}

fn clause_name(re: &Regex, raw: &str) -> Option<String> {
    let rest = re.captures(raw)?.get(1)?.as_str();
    let rest = rest
        .split(|c: char| matches!(c, '?' | '.' | '!' | ',' | ';'))
        .next()
        .unwrap_or("");

    let mut words = Vec::new();
    for word in rest.split_whitespace() {
        if CLAUSE_TERMINATORS.contains(&word.to_lowercase().as_str()) {
            break;
        }
        words.push(word);
    }
    if words.is_empty() {
        return None;
    }
    let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    if lowered.iter().all(|w| RANKING_WORDS.contains(&w.as_str()) || is_stopword(w)) {
        return None;
    }
    Some(words.join(" "))
}
