//! Required-parameter gate run before any node is called.

use super::error::ResolveError;
use super::extractor::ParameterBinding;
use crate::catalog::EndpointDescriptor;

/// Fail with the missing required parameters, in declaration order.
pub fn validate_binding(
    endpoint: &EndpointDescriptor,
    binding: &ParameterBinding,
) -> Result<(), ResolveError> {
    let missing: Vec<String> = endpoint
        .required_parameters
        .iter()
        .filter(|p| !binding.contains(&p.name))
        .map(|p| p.name.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ResolveError::MissingParameters {
            endpoint: endpoint.api_name.clone(),
            names: missing,
        })
    }
}
