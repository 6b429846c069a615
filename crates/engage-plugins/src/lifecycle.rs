//! Lifecycle guard around plugin instances
//!
//! `ManagedPlugin` is how the host holds a plugin. It tracks the lifecycle
//! state and refuses transitions the contract does not allow, so a plugin's
//! hooks are never invoked twice or out of order.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use engage_core::EngageError;

use crate::plugin::Plugin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Constructed,
    Activated,
    /// Terminal
    Disposed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Constructed => write!(f, "Constructed"),
            LifecycleState::Activated => write!(f, "Activated"),
            LifecycleState::Disposed => write!(f, "Disposed"),
        }
    }
}

#[derive(Debug)]
pub struct ManagedPlugin {
    instance_id: Uuid,
    class_name: String,
    plugin: Box<dyn Plugin>,
    state: LifecycleState,
}

impl ManagedPlugin {
    pub fn new(class_name: impl Into<String>, plugin: Box<dyn Plugin>) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            class_name: class_name.into(),
            plugin,
            state: LifecycleState::Constructed,
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }

    pub fn interaction_id(&self) -> Option<&str> {
        self.plugin.base().context().interaction_id()
    }

    /// `Constructed -> Activated`
    pub async fn activate(&mut self) -> Result<(), EngageError> {
        if self.state != LifecycleState::Constructed {
            return Err(self.violation("activate"));
        }

        self.plugin.on_activate().await;
        self.state = LifecycleState::Activated;

        tracing::debug!(
            instance_id = %self.instance_id,
            plugin = %self.class_name,
            interaction_id = ?self.interaction_id(),
            "Plugin activated"
        );
        Ok(())
    }

    /// `Constructed | Activated -> Disposed`
    pub async fn dispose(&mut self) -> Result<(), EngageError> {
        if self.state == LifecycleState::Disposed {
            return Err(self.violation("dispose"));
        }

        let was_activated = self.state == LifecycleState::Activated;
        self.plugin.on_dispose().await;
        self.state = LifecycleState::Disposed;

        tracing::debug!(
            instance_id = %self.instance_id,
            plugin = %self.class_name,
            was_activated = was_activated,
            "Plugin disposed"
        );
        Ok(())
    }

    fn violation(&self, action: &'static str) -> EngageError {
        EngageError::LifecycleViolation {
            plugin: format!("{} ({})", self.class_name, self.instance_id),
            state: self.state.to_string(),
            action,
        }
    }
}
