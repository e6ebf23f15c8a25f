use serde::{Deserialize, Serialize};

/// A single declared parameter of a remote endpoint.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default = "default_parameter_kind")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

fn default_parameter_kind() -> String {
    "string".to_string()
}

/// Static description of one remote API endpoint.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct EndpointDescriptor {
    pub id: String,
    pub category_name: String,
    pub tool_name: String,
    pub api_name: String,
    #[serde(alias = "api_description", default)]
    pub description: String,
    #[serde(default)]
    pub required_parameters: Vec<Parameter>,
    #[serde(default)]
    pub optional_parameters: Vec<Parameter>,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(alias = "api_url")]
    pub url_template: String,
    #[serde(alias = "template_response", default)]
    pub response_shape_hint: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Coarse grouping of endpoints that share default-limit behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointFamily {
    TrendingTracks,
    TrendingPlaylists,
    Search,
    PlaylistLookup,
    Collection,
}

impl EndpointFamily {
    pub fn default_limit(&self) -> u64 {
        match self {
            EndpointFamily::TrendingTracks => 3,
            EndpointFamily::TrendingPlaylists => 1,
            EndpointFamily::PlaylistLookup => 1,
            EndpointFamily::Search => 5,
            EndpointFamily::Collection => 10,
        }
    }
}

impl EndpointDescriptor {
    /// Names of the `{placeholder}` segments in the url template, in order.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut rest = self.url_template.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    out.push(&after[..end]);
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }
        out
    }

    /// Required then optional parameters, in declaration order.
    pub fn all_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.required_parameters
            .iter()
            .chain(self.optional_parameters.iter())
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required_parameters.iter().any(|p| p.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.all_parameters().any(|p| p.name == name)
    }

    pub fn family(&self) -> EndpointFamily {
        let url = self.url_template.as_str();
        if url.contains("/trending") {
            if self.category_name.eq_ignore_ascii_case("playlists") {
                EndpointFamily::TrendingPlaylists
            } else {
                EndpointFamily::TrendingTracks
            }
        } else if url.ends_with("/search") {
            EndpointFamily::Search
        } else if self.category_name.eq_ignore_ascii_case("playlists") {
            EndpointFamily::PlaylistLookup
        } else {
            EndpointFamily::Collection
        }
    }
}
