//! Plugin contract
//!
//! Client code implements [`Plugin`] to take part in interactions the server
//! delivers. The host constructs one instance per active interaction through a
//! registered [`PluginFactory`], calls [`Plugin::on_activate`] once the
//! interaction is confirmed active, and [`Plugin::on_dispose`] when the
//! hosting view goes away.
//!
//! Lifecycle: `Constructed -> Activated -> Disposed`, with
//! `Constructed -> Disposed` allowed when activation never happens. Each hook
//! runs at most once per instance and activation always precedes disposal.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

use engage_core::{ClientHandle, InteractionContext};

/// References every plugin receives at construction.
///
/// Embed this in a plugin struct and return it from [`Plugin::base`]. The
/// client handle is weak; the interaction context is a shared read-only
/// snapshot owned by the host.
#[derive(Debug, Clone)]
pub struct PluginBase {
    client: ClientHandle,
    context: Arc<InteractionContext>,
}

impl PluginBase {
    /// Store the host-provided references. Performs no other work.
    pub fn new(client: ClientHandle, context: Arc<InteractionContext>) -> Self {
        Self { client, context }
    }

    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub fn context(&self) -> &InteractionContext {
        &self.context
    }
}

/// Trait that all plugins must implement
///
/// Both hooks default to no-ops. Hooks run on the host's task and must not
/// block it for unbounded time. There is no failure channel back to the host:
/// a plugin that cannot set itself up handles that internally.
#[async_trait]
pub trait Plugin: Send + Debug {
    fn base(&self) -> &PluginBase;

    /// Called once the interaction is registered and active. Do setup here,
    /// not in the constructor.
    async fn on_activate(&mut self) {}

    /// Called when the hosting view is dismissed. Release whatever
    /// `on_activate` acquired; this may be the first hook the instance sees.
    async fn on_dispose(&mut self) {}
}

#[async_trait]
impl Plugin for PluginBase {
    fn base(&self) -> &PluginBase {
        self
    }
}

/// Constructor the host calls for each interaction a plugin class serves
pub type PluginFactory =
    Arc<dyn Fn(ClientHandle, Arc<InteractionContext>) -> Box<dyn Plugin> + Send + Sync>;

/// Plugin information for listing registered plugins
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    /// Plugin class name the server refers to, e.g. `Plugins.Banner`
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Interaction types the plugin serves (e.g. ["banner"])
    pub interaction_types: Vec<String>,
}
