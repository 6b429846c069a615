//! Test helpers for plugin unit tests
//!
//! A plugin that records every hook it receives into a shared call log, so
//! tests can assert on order and multiplicity of lifecycle calls.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use engage_core::{ClientHandle, InteractionContext};

use crate::plugin::{Plugin, PluginBase, PluginInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    Activate(String),
    Dispose(String),
}

/// Shared, ordered log of hook calls across plugin instances
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<HookCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<HookCall> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, call: HookCall) {
        self.0.lock().unwrap().push(call);
    }
}

#[derive(Debug)]
pub struct RecordingPlugin {
    base: PluginBase,
    log: CallLog,
}

impl RecordingPlugin {
    fn label(&self) -> String {
        self.base
            .context()
            .interaction_id()
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn base(&self) -> &PluginBase {
        &self.base
    }

    async fn on_activate(&mut self) {
        self.log.push(HookCall::Activate(self.label()));
    }

    async fn on_dispose(&mut self) {
        self.log.push(HookCall::Dispose(self.label()));
    }
}

/// A detached recording plugin for the given interaction id
pub fn recording_plugin(interaction_id: &str, log: &CallLog) -> RecordingPlugin {
    RecordingPlugin {
        base: PluginBase::new(
            ClientHandle::detached(),
            Arc::new(InteractionContext::new(interaction_id, "banner", "top")),
        ),
        log: log.clone(),
    }
}

/// Constructor suitable for `PluginRegistry::register`
pub fn recording_factory(
    log: &CallLog,
) -> impl Fn(ClientHandle, Arc<InteractionContext>) -> RecordingPlugin + Send + Sync + 'static {
    let log = log.clone();
    move |client, context| RecordingPlugin {
        base: PluginBase::new(client, context),
        log: log.clone(),
    }
}

pub fn plugin_info(name: &str) -> PluginInfo {
    PluginInfo {
        name: name.to_string(),
        description: format!("{} test plugin", name),
        interaction_types: vec!["banner".to_string()],
    }
}
