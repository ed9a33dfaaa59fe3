//! Opaque per-connector settings
//!
//! The registry never looks inside these; each connector deserializes them
//! into its own settings struct.

use crate::error::{ConnectorError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorSettings(pub serde_yaml::Value);

impl ConnectorSettings {
    pub fn new(value: serde_yaml::Value) -> Self {
        Self(value)
    }

    /// Parse settings from a YAML snippet. Mostly useful in tests.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml).map(Self)
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_yaml::Value::Null => true,
            serde_yaml::Value::Mapping(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Deserialize into `T`, falling back to `T::default()` when empty.
    pub fn parse<T>(&self, connector: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        if self.is_empty() {
            return Ok(T::default());
        }
        serde_yaml::from_value(self.0.clone()).map_err(|e| ConnectorError::InvalidSettings {
            name: connector.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        size: u32,
    }

    #[test]
    fn test_empty_settings_use_default() {
        let settings = ConnectorSettings::default();
        assert!(settings.is_empty());
        assert_eq!(settings.parse::<Sample>("x").unwrap(), Sample::default());
    }

    #[test]
    fn test_parse_settings() {
        let settings = ConnectorSettings::from_yaml("size: 7").unwrap();
        assert_eq!(settings.parse::<Sample>("x").unwrap(), Sample { size: 7 });
    }

    #[test]
    fn test_invalid_settings() {
        let settings = ConnectorSettings::from_yaml("size: lots").unwrap();
        assert!(matches!(
            settings.parse::<Sample>("sample"),
            Err(ConnectorError::InvalidSettings { .. })
        ));
    }
}
