use thiserror::Error;

/// Everything that can stop a single query resolution.
///
/// None of these are fatal for the process. The display text is meant for
/// logs, [`ResolveError::user_message`] is what an end user gets to see.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Query is outside the supported music domain")]
    UnsupportedQuery,

    #[error("No catalog endpoint matches the query")]
    NoSuitableEndpoint,

    #[error("Endpoint '{endpoint}' is missing required parameters: {}", names.join(", "))]
    MissingParameters {
        endpoint: String,
        names: Vec<String>,
    },

    #[error("Requested resource was not found")]
    NotFound,

    #[error("Discovery node failed after {attempts} attempts: {last_error}")]
    TransientFailure { attempts: u32, last_error: String },

    #[error("All {attempted} discovery nodes failed, last error: {last_error}")]
    AllNodesExhausted {
        attempted: usize,
        last_error: String,
    },

    #[error("No data available for the {calculation} calculation")]
    NoDataAvailable { calculation: &'static str },

    #[error("Node returned an unusable payload: {0}")]
    InvalidPayload(String),
}

impl ResolveError {
    /// Stable identifier, used in logs, metrics and the HTTP surface.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::UnsupportedQuery => "unsupported_query",
            ResolveError::NoSuitableEndpoint => "no_suitable_endpoint",
            ResolveError::MissingParameters { .. } => "missing_parameters",
            ResolveError::NotFound => "not_found",
            ResolveError::TransientFailure { .. } => "transient_failure",
            ResolveError::AllNodesExhausted { .. } => "all_nodes_exhausted",
            ResolveError::NoDataAvailable { .. } => "no_data_available",
            ResolveError::InvalidPayload(_) => "invalid_payload",
        }
    }

    /// Text safe to show to the person who asked `query`.
    pub fn user_message(&self, query: &str) -> String {
        match self {
            ResolveError::UnsupportedQuery | ResolveError::NoSuitableEndpoint => format!(
                "Sorry, I could not understand \"{}\". Try asking about trending tracks, artists, playlists or genres.",
                query
            ),
            ResolveError::NotFound => {
                format!("Sorry, nothing matching \"{}\" could be found.", query)
            }
            ResolveError::NoDataAvailable { .. } => format!(
                "Sorry, there is no data available right now to answer \"{}\".",
                query
            ),
            ResolveError::MissingParameters { .. }
            | ResolveError::TransientFailure { .. }
            | ResolveError::AllNodesExhausted { .. }
            | ResolveError::InvalidPayload(_) => format!(
                "Sorry, something went wrong while answering \"{}\". Please try again later.",
                query
            ),
        }
    }
}
