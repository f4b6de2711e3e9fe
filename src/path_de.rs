use serde::de::DeserializeOwned;

/// A deserialization failure together with the JSON path it happened at.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("at JSON path {path} → {message}")]
pub struct PathError {
    pub path: String,
    pub message: String,
}

impl<E: std::fmt::Display> From<serde_path_to_error::Error<E>> for PathError {
    fn from(err: serde_path_to_error::Error<E>) -> Self {
        let path = err.path().to_string();
        PathError { path, message: err.into_inner().to_string() }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

/// YAML is a superset of JSON, so schema documents of either flavor go through here.
pub fn from_yaml_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = serde_yaml::Deserializer::from_str(src);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

/// Decode an already-parsed tree into a typed view, keeping the path of the failing node.
pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, PathError> {
    Ok(serde_path_to_error::deserialize::<_, T>(value)?)
}
