//! Engage Core Library
//!
//! This crate provides the host-side session, the event bus plugins share,
//! interaction models, error types and configuration used by the plugin
//! runtime.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod models;

// Re-export commonly used types
pub use client::{resolve_screen_name, Client, ClientHandle};
pub use config::{ClientConfig, SimulatorSession};
pub use error::{EngageError, LogLevel};
pub use events::{Event, EventHandler, EventKind, EventManager};
pub use models::{
    parameters_to_map, Connection, ConnectionRecord, InteractionContext, InteractionRecord,
    InteractionsResponse, InteractionsResult, LocaleParameters, ParameterEntry, ParameterMap,
    ProfileCache,
};
