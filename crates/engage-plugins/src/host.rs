//! Plugin host
//!
//! Turns an interactions result into live plugin instances and drives their
//! lifecycle: construct for every interaction whose plugin class is
//! registered, activate them in order, and dispose the whole set when the
//! hosting view changes or is dismissed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use engage_core::{
    resolve_screen_name, Client, ClientHandle, Connection, EngageError, InteractionContext,
    InteractionRecord, InteractionsResponse, LogLevel,
};

use crate::lifecycle::{LifecycleState, ManagedPlugin};
use crate::registry::PluginRegistry;

/// Snapshot of a plugin the host currently holds
#[derive(Debug, Clone, Serialize)]
pub struct PluginSummary {
    pub instance_id: Uuid,
    pub class_name: String,
    pub interaction_id: Option<String>,
    pub state: LifecycleState,
}

pub struct PluginHost {
    client: Arc<Client>,
    registry: PluginRegistry,
    current: Vec<ManagedPlugin>,
}

impl PluginHost {
    pub fn new(client: Arc<Client>, registry: PluginRegistry) -> Self {
        Self {
            client,
            registry,
            current: Vec::new(),
        }
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn current(&self) -> Vec<PluginSummary> {
        self.current
            .iter()
            .map(|plugin| PluginSummary {
                instance_id: plugin.instance_id(),
                class_name: plugin.class_name().to_string(),
                interaction_id: plugin.interaction_id().map(str::to_string),
                state: plugin.state(),
            })
            .collect()
    }

    /// Apply an interactions result given as raw JSON text.
    pub async fn apply_interactions_json(&mut self, body: &str) -> Result<usize, EngageError> {
        let response: InteractionsResponse = serde_json::from_str(body)?;
        self.apply_response(response).await
    }

    /// Apply an interactions result: `{"result": {"interactions": [...], "connections": [...]}}`.
    ///
    /// Replaces the client's connections when the result carries a connection
    /// list, constructs a plugin for every interaction whose class resolves
    /// and activates them in order. Plugins from an earlier result are
    /// disposed first. Returns the number of plugins activated.
    pub async fn apply_interactions(
        &mut self,
        result: &serde_json::Value,
    ) -> Result<usize, EngageError> {
        let response = InteractionsResponse::deserialize(result)?;
        self.apply_response(response).await
    }

    async fn apply_response(&mut self, response: InteractionsResponse) -> Result<usize, EngageError> {
        let result = response.result.ok_or_else(|| {
            EngageError::InvalidInteractions("missing 'result' object".to_string())
        })?;

        if let Some(records) = &result.connections {
            let connections: Vec<Connection> =
                records.iter().filter_map(Connection::from_record).collect();
            self.client.replace_connections(connections).await;
        }

        let plugins = self.instantiate(&result.interactions).await;
        if plugins.is_empty() {
            tracing::debug!(
                interactions = result.interactions.len(),
                "No registered plugin for any interaction"
            );
            return Ok(0);
        }

        Ok(self.load(plugins).await)
    }

    async fn instantiate(&self, records: &[InteractionRecord]) -> Vec<ManagedPlugin> {
        let app_id = self.client.app_id().await;
        let locale = self.client.locale().await;
        let handle = ClientHandle::new(&self.client);

        let mut plugins = Vec::new();
        for record in records {
            let (Some(interaction_id), Some(class_name), Some(interaction_type)) = (
                record.id.as_deref(),
                record.plugin_class.as_deref(),
                record.interaction_type.as_deref(),
            ) else {
                tracing::debug!(
                    interaction_id = ?record.id,
                    plugin_class = ?record.plugin_class,
                    interaction_type = ?record.interaction_type,
                    "Skipping incomplete interaction"
                );
                continue;
            };

            let Some((name, factory)) = self.registry.resolve(class_name, &app_id).await else {
                log_host_error(&EngageError::PluginNotFound(class_name.to_string()));
                continue;
            };

            tracing::debug!(
                plugin = %name,
                interaction_id = interaction_id,
                interaction_type = interaction_type,
                "Constructing plugin for interaction"
            );

            let context = InteractionContext::from_record(record, locale.as_deref())
                .with_client(handle.clone());
            let plugin = factory(handle.clone(), Arc::new(context));
            plugins.push(ManagedPlugin::new(name, plugin));
        }

        plugins
    }

    async fn load(&mut self, plugins: Vec<ManagedPlugin>) -> usize {
        if !self.current.is_empty() {
            tracing::debug!(
                count = self.current.len(),
                "Disposing plugins superseded by a new interactions result"
            );
            self.dispose_all().await;
        }

        let mut activated = 0;
        for mut plugin in plugins {
            match plugin.activate().await {
                Ok(()) => activated += 1,
                Err(err) => log_host_error(&err),
            }
            self.current.push(plugin);
        }

        tracing::info!(activated = activated, "Plugins loaded");
        activated
    }

    /// A new page view: dispose the current plugins, record the screen name
    /// and drop queued events published on other screens. Returns the number
    /// of plugins disposed.
    pub async fn page_view(
        &mut self,
        properties: Option<&HashMap<String, String>>,
        fallback_title: Option<&str>,
    ) -> usize {
        let disposed = self.dispose_all().await;

        if let Some(screen_name) = resolve_screen_name(properties, fallback_title) {
            tracing::debug!(screen_name = %screen_name, "Screen name");
            self.client.set_screen_name(&screen_name).await;
        }
        self.client.cleanup_events().await;

        disposed
    }

    /// The hosting view was dismissed: dispose and drop every current plugin.
    pub async fn dispose_all(&mut self) -> usize {
        let plugins = std::mem::take(&mut self.current);

        let mut disposed = 0;
        for mut plugin in plugins {
            match plugin.dispose().await {
                Ok(()) => disposed += 1,
                Err(err) => log_host_error(&err),
            }
        }
        disposed
    }
}

impl Drop for PluginHost {
    fn drop(&mut self) {
        let live = self
            .current
            .iter()
            .filter(|plugin| plugin.state() != LifecycleState::Disposed)
            .count();
        if live > 0 {
            tracing::warn!(count = live, "Plugin host dropped with undisposed plugins");
        }
    }
}

fn log_host_error(error: &EngageError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code = error_code, "Plugin host error");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code = error_code, "Plugin host error");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code = error_code, "Plugin host error");
        }
    }
}
