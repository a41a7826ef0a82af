//! Reading IR documents from JSON.
//!
//! Shape errors carry the JSON path of the offending node.

use serde::de::DeserializeOwned;

use crate::error::LoadError;
use crate::ir::Namespace;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_load_error)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_load_error)
}

fn into_load_error(err: serde_path_to_error::Error<serde_json::Error>) -> LoadError {
    let path = err.path().to_string();
    LoadError::Shape { path, source: err.into_inner() }
}

/// One namespace document.
pub fn namespace_from_str(src: &str) -> Result<Namespace, LoadError> {
    let mut ns: Namespace = from_str_with_path(src)?;
    ns.assign_names();
    Ok(ns)
}

pub fn namespace_from_slice(bytes: &[u8]) -> Result<Namespace, LoadError> {
    let mut ns: Namespace = from_slice_with_path(bytes)?;
    ns.assign_names();
    Ok(ns)
}

/// A JSON array of namespace documents.
pub fn namespaces_from_str(src: &str) -> Result<Vec<Namespace>, LoadError> {
    let mut namespaces: Vec<Namespace> = from_str_with_path(src)?;
    for ns in &mut namespaces {
        ns.assign_names();
    }
    Ok(namespaces)
}
