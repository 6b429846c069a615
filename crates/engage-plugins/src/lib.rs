//! Engage Plugins
//!
//! This crate provides the plugin contract client code implements, and the
//! host runtime that constructs, activates and disposes plugins for the
//! interactions the server delivers.

#[cfg(feature = "plugin")]
pub mod host;
#[cfg(feature = "plugin")]
pub mod lifecycle;
#[cfg(feature = "plugin")]
pub mod plugin;
#[cfg(feature = "plugin")]
pub mod registry;

// Re-export commonly used types
#[cfg(feature = "plugin")]
pub use host::{PluginHost, PluginSummary};
#[cfg(feature = "plugin")]
pub use lifecycle::{LifecycleState, ManagedPlugin};
#[cfg(feature = "plugin")]
pub use plugin::{Plugin, PluginBase, PluginFactory, PluginInfo};
#[cfg(feature = "plugin")]
pub use registry::PluginRegistry;

// Test helpers (only available in test mode)
#[cfg(test)]
pub mod test_helpers;
