//! Plugin registry for managing available plugins

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use engage_core::{ClientHandle, EngageError, InteractionContext};

use crate::plugin::{Plugin, PluginFactory, PluginInfo};

/// Registry mapping plugin class names to the factories that build them.
///
/// Thread-safe and async-compatible using tokio's RwLock. Class-name
/// resolutions, including misses, are cached until the next registration.
#[derive(Clone)]
pub struct PluginRegistry {
    factories: Arc<RwLock<HashMap<String, PluginFactory>>>,
    plugin_info: Arc<RwLock<HashMap<String, PluginInfo>>>,
    resolved: Arc<RwLock<HashMap<String, Option<String>>>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
            plugin_info: Arc::new(RwLock::new(HashMap::new())),
            resolved: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a plugin constructor under `info.name`
    pub async fn register<F, P>(&self, info: PluginInfo, constructor: F) -> Result<(), EngageError>
    where
        F: Fn(ClientHandle, Arc<InteractionContext>) -> P + Send + Sync + 'static,
        P: Plugin + 'static,
    {
        let factory: PluginFactory = Arc::new(
            move |client: ClientHandle, context: Arc<InteractionContext>| -> Box<dyn Plugin> {
                Box::new(constructor(client, context))
            },
        );
        self.register_factory(info, factory).await
    }

    /// Register an already boxed factory. A later registration under the same
    /// name replaces the earlier one.
    pub async fn register_factory(
        &self,
        info: PluginInfo,
        factory: PluginFactory,
    ) -> Result<(), EngageError> {
        let name = info.name.trim().to_string();
        if name.is_empty() {
            return Err(EngageError::InvalidInput(
                "plugin name must not be empty".to_string(),
            ));
        }

        let mut factories = self.factories.write().await;
        let mut plugin_info = self.plugin_info.write().await;
        let mut resolved = self.resolved.write().await;

        factories.insert(name.clone(), factory);
        plugin_info.insert(
            name.clone(),
            PluginInfo {
                name: name.clone(),
                ..info
            },
        );
        resolved.clear();

        tracing::debug!(plugin = %name, "Plugin registered");
        Ok(())
    }

    /// Get a plugin factory by its registered name
    pub async fn get(&self, name: &str) -> Result<PluginFactory, EngageError> {
        let factories = self.factories.read().await;

        factories
            .get(name)
            .cloned()
            .ok_or_else(|| EngageError::PluginNotFound(name.to_string()))
    }

    /// List all registered plugins
    pub async fn list(&self) -> Vec<PluginInfo> {
        let plugin_info = self.plugin_info.read().await;

        plugin_info.values().cloned().collect()
    }

    /// Check if a plugin is registered
    pub async fn contains(&self, name: &str) -> bool {
        let factories = self.factories.read().await;

        factories.contains_key(name)
    }

    /// Resolve the class name an interaction refers to.
    ///
    /// Lookup order: the class name itself, the part after the first `.`
    /// (`Plugins.Banner` -> `Banner`), and that part qualified with the app
    /// name (`{app_name}.Banner`). Returns the registered name and factory.
    pub async fn resolve(
        &self,
        class_name: &str,
        app_name: &str,
    ) -> Option<(String, PluginFactory)> {
        let cached = self.resolved.read().await.get(class_name).cloned();
        if let Some(entry) = cached {
            let name = entry?;
            let factory = self.factories.read().await.get(&name).cloned()?;
            return Some((name, factory));
        }

        let mut candidates = vec![class_name.to_string()];
        if let Some((_, suffix)) = class_name.split_once('.') {
            candidates.push(suffix.to_string());
            if !app_name.is_empty() {
                candidates.push(format!("{}.{}", app_name, suffix));
            }
        }

        // Both guards live until the cache insert. Lock order matches
        // `register_factory`: factories, then resolved.
        let factories = self.factories.read().await;
        let mut resolved = self.resolved.write().await;

        let found = candidates.into_iter().find_map(|candidate| {
            factories
                .get(&candidate)
                .cloned()
                .map(|factory| (candidate, factory))
        });

        match &found {
            Some((name, _)) if name != class_name => {
                tracing::debug!(class_name = class_name, plugin = %name, "Plugin found under alias");
            }
            Some(_) => {}
            None => {
                tracing::debug!(class_name = class_name, "Plugin class not found");
            }
        }

        resolved.insert(
            class_name.to_string(),
            found.as_ref().map(|(name, _)| name.clone()),
        );

        found
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
