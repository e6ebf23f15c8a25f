mod endpoint;
mod load;
mod validation;

pub use endpoint::{EndpointDescriptor, EndpointFamily, Parameter};
pub use load::load_catalog;
pub use validation::{validate_catalog, validate_endpoint, CatalogError};

use std::collections::HashMap;

const BUILTIN_ENDPOINTS: &str = include_str!("endpoints.json");

/// Read-only collection of endpoint descriptors, in declaration order.
#[derive(Debug)]
pub struct Catalog {
    endpoints: Vec<EndpointDescriptor>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Parse and validate a JSON array of endpoint descriptors.
    pub fn from_json(json: &str) -> Result<Catalog, CatalogError> {
        let endpoints: Vec<EndpointDescriptor> = serde_json::from_str(json)?;
        Catalog::from_endpoints(endpoints)
    }

    pub fn from_endpoints(endpoints: Vec<EndpointDescriptor>) -> Result<Catalog, CatalogError> {
        validate_catalog(&endpoints)?;
        let by_name = endpoints
            .iter()
            .enumerate()
            .map(|(i, e)| (e.api_name.clone(), i))
            .collect();
        Ok(Catalog { endpoints, by_name })
    }

    /// The catalog embedded in the binary.
    pub fn builtin() -> Result<Catalog, CatalogError> {
        Catalog::from_json(BUILTIN_ENDPOINTS)
    }

    pub fn endpoints(&self) -> &[EndpointDescriptor] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn by_api_name(&self, api_name: &str) -> Option<&EndpointDescriptor> {
        self.by_name.get(api_name).map(|i| &self.endpoints[*i])
    }

    /// Endpoints whose category is in `categories`, keeping declaration
    /// order. An empty filter returns the whole catalog.
    pub fn in_categories(&self, categories: &[String]) -> Vec<&EndpointDescriptor> {
        if categories.is_empty() {
            return self.endpoints.iter().collect();
        }
        self.endpoints
            .iter()
            .filter(|e| {
                categories
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&e.category_name))
            })
            .collect()
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for e in &self.endpoints {
            if !out.contains(&e.category_name.as_str()) {
                out.push(&e.category_name);
            }
        }
        out
    }
}
