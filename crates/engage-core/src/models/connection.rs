//! Connections delivered alongside interactions

use serde::{Deserialize, Serialize};

use super::interaction::LocaleParameters;
use super::{null_as_default, parameters_to_map, ParameterMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<LocaleParameters>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    id: String,
    parameters: ParameterMap,
}

impl Connection {
    pub fn new(id: impl Into<String>, parameters: ParameterMap) -> Self {
        Self {
            id: id.into(),
            parameters,
        }
    }

    /// Build a connection from its record, using the parameters of the first
    /// locale block. Records without an id or without any block are skipped.
    pub fn from_record(record: &ConnectionRecord) -> Option<Self> {
        let id = record.id.as_deref()?;
        let first = record.parameters.first()?;
        Some(Self::new(id, parameters_to_map(&first.parameter)))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&[String]> {
        self.parameters.get(name).map(Vec::as_slice)
    }
}
