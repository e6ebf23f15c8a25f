//! Structural checks run once when the endpoint catalog is loaded.
//!
//! Any violation here is fatal at startup: the pipeline assumes every
//! descriptor it selects can be fully rendered.

use super::EndpointDescriptor;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog contains no endpoints")]
    Empty,

    #[error("Endpoint '{endpoint}' has an empty '{field}' field")]
    EmptyField {
        endpoint: String,
        field: &'static str,
    },

    #[error("Endpoint name '{0}' is declared more than once")]
    DuplicateApiName(String),

    #[error("Endpoint '{endpoint}' uses placeholder '{placeholder}' without a matching required parameter")]
    UnboundPlaceholder {
        endpoint: String,
        placeholder: String,
    },
}

pub type ValidationResult<T> = Result<T, CatalogError>;

/// Validate a single descriptor in isolation.
pub fn validate_endpoint(endpoint: &EndpointDescriptor) -> ValidationResult<()> {
    let label = if endpoint.api_name.trim().is_empty() {
        endpoint.id.clone()
    } else {
        endpoint.api_name.clone()
    };
    let fields: [(&'static str, &str); 4] = [
        ("id", &endpoint.id),
        ("api_name", &endpoint.api_name),
        ("category_name", &endpoint.category_name),
        ("url_template", &endpoint.url_template),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(CatalogError::EmptyField {
                endpoint: label,
                field,
            });
        }
    }

    for placeholder in endpoint.placeholders() {
        if !endpoint.is_required(placeholder) {
            return Err(CatalogError::UnboundPlaceholder {
                endpoint: label,
                placeholder: placeholder.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate the whole catalog: every descriptor plus name uniqueness.
pub fn validate_catalog(endpoints: &[EndpointDescriptor]) -> ValidationResult<()> {
    if endpoints.is_empty() {
        return Err(CatalogError::Empty);
    }
    let mut seen = HashSet::new();
    for endpoint in endpoints {
        validate_endpoint(endpoint)?;
        if !seen.insert(endpoint.api_name.as_str()) {
            return Err(CatalogError::DuplicateApiName(endpoint.api_name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Parameter;

    fn make_endpoint(api_name: &str, url: &str, required: &[&str]) -> EndpointDescriptor {
        EndpointDescriptor {
            id: api_name.to_lowercase().replace(' ', "-"),
            category_name: "Tracks".to_string(),
            tool_name: api_name.to_lowercase().replace(' ', "_"),
            api_name: api_name.to_string(),
            description: String::new(),
            required_parameters: required
                .iter()
                .map(|n| Parameter {
                    name: n.to_string(),
                    kind: "string".to_string(),
                    description: String::new(),
                    default: None,
                })
                .collect(),
            optional_parameters: vec![],
            method: "GET".to_string(),
            url_template: url.to_string(),
            response_shape_hint: String::new(),
        }
    }

    #[test]
    fn test_valid_endpoint() {
        let e = make_endpoint("Get Track", "/v1/tracks/{track_id}", &["track_id"]);
        assert!(validate_endpoint(&e).is_ok());
    }

    #[test]
    fn test_empty_api_name() {
        let e = make_endpoint("", "/v1/tracks", &[]);
        assert!(matches!(
            validate_endpoint(&e),
            Err(CatalogError::EmptyField {
                field: "api_name",
                ..
            })
        ));
    }

    #[test]
    fn test_unbound_placeholder() {
        let e = make_endpoint("Get Track", "/v1/tracks/{track_id}", &[]);
        match validate_endpoint(&e) {
            Err(CatalogError::UnboundPlaceholder { placeholder, .. }) => {
                assert_eq!(placeholder, "track_id")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_api_name() {
        let a = make_endpoint("Get Track", "/v1/tracks/{track_id}", &["track_id"]);
        let b = make_endpoint("Get Track", "/v2/tracks/{track_id}", &["track_id"]);
        assert!(matches!(
            validate_catalog(&[a, b]),
            Err(CatalogError::DuplicateApiName(name)) if name == "Get Track"
        ));
    }

    #[test]
    fn test_empty_catalog() {
        assert!(matches!(validate_catalog(&[]), Err(CatalogError::Empty)));
    }
}
