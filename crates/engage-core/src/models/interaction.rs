//! Interaction records and the interaction context handed to plugins

use serde::{Deserialize, Serialize};

use super::connection::{Connection, ConnectionRecord};
use super::{null_as_default, parameters_to_map, ParameterMap};
use crate::client::ClientHandle;

/// One `{id, value}` parameter entry of an interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: Vec<String>,
}

/// Parameters of an interaction for a single locale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocaleParameters {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameter: Vec<ParameterEntry>,
}

/// An interaction as delivered in the interactions result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub plugin_class: Option<String>,
    #[serde(default, rename = "myInteractionTypeId")]
    pub interaction_type: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub default_locale: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<LocaleParameters>,
}

/// Body of the interactions result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionsResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub interactions: Vec<InteractionRecord>,
    /// Absent when the server sent no connection list
    #[serde(default)]
    pub connections: Option<Vec<ConnectionRecord>>,
}

/// Envelope around the interactions result: `{"result": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionsResponse {
    #[serde(default)]
    pub result: Option<InteractionsResult>,
}

/// Host-supplied description of where and how a plugin is invoked.
///
/// The context is immutable once built; the host shares it with the plugin
/// through an `Arc`. Connection lookups go through the client the context was
/// attached to, and return `None` once that session is gone.
#[derive(Debug, Clone, Default)]
pub struct InteractionContext {
    id: Option<String>,
    interaction_type: Option<String>,
    position_identifier: Option<String>,
    parameters: ParameterMap,
    locale: Option<String>,
    default_locale: Option<String>,
    client: ClientHandle,
}

impl InteractionContext {
    pub fn new(
        id: impl Into<String>,
        interaction_type: impl Into<String>,
        position_identifier: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            interaction_type: Some(interaction_type.into()),
            position_identifier: Some(position_identifier.into()),
            ..Self::default()
        }
    }

    /// Build the context for an interaction record, resolving its parameters
    /// for `locale`. A blank or missing locale falls back to the record's
    /// default locale.
    pub fn from_record(record: &InteractionRecord, locale: Option<&str>) -> Self {
        let requested = locale.map(str::trim).filter(|l| !l.is_empty());

        let parameters = match requested.or(record.default_locale.as_deref()) {
            Some(selected) => resolve_locale_parameters(record, selected),
            None => ParameterMap::new(),
        };

        Self {
            id: record.id.clone(),
            interaction_type: record.interaction_type.clone(),
            position_identifier: record.position.clone(),
            parameters,
            locale: requested.map(str::to_string),
            default_locale: record.default_locale.clone(),
            client: ClientHandle::detached(),
        }
    }

    pub fn with_client(mut self, client: ClientHandle) -> Self {
        self.client = client;
        self
    }

    pub fn interaction_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn interaction_type(&self) -> Option<&str> {
        self.interaction_type.as_deref()
    }

    /// Selector of the position, e.g. `#position_1`
    pub fn position_identifier(&self) -> Option<&str> {
        self.position_identifier.as_deref()
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&[String]> {
        self.parameters.get(name).map(Vec::as_slice)
    }

    pub fn first_parameter(&self, name: &str) -> Option<&str> {
        self.parameter(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Locale requested by the client, if any
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub async fn connection(&self, id: &str) -> Option<Connection> {
        if id.trim().is_empty() {
            return None;
        }
        let client = self.client.upgrade()?;
        client.connection(id).await
    }
}

fn find_locale<'a>(record: &'a InteractionRecord, locale: &str) -> Option<&'a LocaleParameters> {
    record
        .parameters
        .iter()
        .find(|block| block.locale.as_deref() == Some(locale))
}

/// Pick the parameter block for `locale`, falling back to the default locale
/// and then to the first locale present.
fn resolve_locale_parameters(record: &InteractionRecord, locale: &str) -> ParameterMap {
    if let Some(block) = find_locale(record, locale) {
        tracing::debug!(interaction_id = ?record.id, locale = locale, "Locale used");
        return parameters_to_map(&block.parameter);
    }

    let available: Vec<&str> = record
        .parameters
        .iter()
        .filter_map(|block| block.locale.as_deref())
        .collect();

    if let Some(default_locale) = record.default_locale.as_deref() {
        if default_locale != locale {
            if let Some(block) = find_locale(record, default_locale) {
                tracing::debug!(
                    interaction_id = ?record.id,
                    locale = locale,
                    default_locale = default_locale,
                    available = ?available,
                    "Locale does not exist, using default locale instead"
                );
                return parameters_to_map(&block.parameter);
            }
        }
    }

    if let Some(first) = record.parameters.first() {
        if first.locale.is_some() {
            tracing::debug!(
                interaction_id = ?record.id,
                locale = locale,
                first_locale = ?first.locale,
                available = ?available,
                "Default locale is not valid, using the first locale instead"
            );
            return parameters_to_map(&first.parameter);
        }
    }

    tracing::debug!(interaction_id = ?record.id, "Interaction has no locales");
    ParameterMap::new()
}
