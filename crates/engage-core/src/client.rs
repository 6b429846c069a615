//! Client session and the non-owning handle plugins receive
//!
//! The host owns the `Client` behind an `Arc`. Plugins only ever get a
//! `ClientHandle`, a weak reference that stops resolving once the host drops
//! the session.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::error::EngageError;
use crate::events::{EventKind, EventManager};
use crate::models::{Connection, ProfileCache};

#[derive(Debug, Default)]
struct SessionState {
    locale: Option<String>,
    screen_name: String,
    connections: Vec<Connection>,
}

/// The active SDK session: configuration, profile cache, locale, screen name,
/// the connections delivered with the last interactions result and the event
/// bus.
///
/// Thread-safe: every piece of state sits behind a tokio `RwLock`.
#[derive(Debug)]
pub struct Client {
    config: RwLock<ClientConfig>,
    profile: RwLock<ProfileCache>,
    session: RwLock<SessionState>,
    events: EventManager,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let session = SessionState {
            locale: config.locale.clone(),
            ..SessionState::default()
        };

        if config.debug_mode {
            tracing::debug!(
                host_name = config.host_name(),
                app_id = %config.app_id,
                "Created new client"
            );
        }

        Self {
            config: RwLock::new(config),
            profile: RwLock::new(ProfileCache::new()),
            session: RwLock::new(session),
            events: EventManager::new(),
        }
    }

    /// Create a client from `ENGAGE_*` environment variables.
    pub fn from_env() -> Result<Self, EngageError> {
        let config =
            ClientConfig::from_env().map_err(|err| EngageError::Config(format!("{:#}", err)))?;
        Ok(Self::new(config))
    }

    pub async fn config(&self) -> ClientConfig {
        self.config.read().await.clone()
    }

    pub async fn app_id(&self) -> String {
        self.config.read().await.app_id.clone()
    }

    /// See [`ClientConfig::apply_simulator_link`].
    pub async fn apply_simulator_link(&self, url: &str) -> bool {
        self.config.write().await.apply_simulator_link(url)
    }

    /// First value of a profile property, or an empty string
    pub async fn profile_value(&self, property: &str) -> String {
        self.profile.read().await.value(property).to_string()
    }

    pub async fn profile_values(&self, property: &str) -> Option<Vec<String>> {
        self.profile.read().await.values(property).map(<[String]>::to_vec)
    }

    pub async fn profile_properties(&self) -> HashMap<String, Vec<String>> {
        self.profile.read().await.properties().clone()
    }

    pub async fn add_profile_value(&self, property: &str, value: &str) {
        if property.is_empty() || value.is_empty() {
            return;
        }
        self.add_profile_values(property, &[value.to_string()]).await;
    }

    /// Add values to a profile property; values already present are kept once.
    pub async fn add_profile_values(&self, property: &str, values: &[String]) {
        if property.is_empty() || values.is_empty() {
            return;
        }
        self.profile.write().await.add(property, values);
    }

    pub async fn set_profile_value(&self, property: &str, value: &str) {
        if property.is_empty() || value.is_empty() {
            return;
        }
        self.set_profile_values(property, &[value.to_string()]).await;
    }

    /// Replace the values of a profile property.
    pub async fn set_profile_values(&self, property: &str, values: &[String]) {
        if property.is_empty() || values.is_empty() {
            return;
        }
        self.profile.write().await.set(property, values);
    }

    pub async fn clear_profile(&self) {
        self.profile.write().await.clear();
    }

    /// Whether the profile changed since the last call
    pub async fn profile_modified(&self) -> bool {
        self.profile.write().await.check_modified()
    }

    pub async fn domain_group(&self) -> Option<String> {
        self.profile.read().await.domain_group().map(str::to_string)
    }

    pub async fn set_domain_group(&self, domain_group: &str) {
        self.profile.write().await.set_domain_group(domain_group);
    }

    pub async fn locale(&self) -> Option<String> {
        self.session.read().await.locale.clone()
    }

    /// Locale interaction parameters are resolved for, e.g. `en_US`
    pub async fn set_locale(&self, locale: &str) {
        self.session.write().await.locale = Some(locale.to_string());
    }

    pub async fn screen_name(&self) -> String {
        self.session.read().await.screen_name.clone()
    }

    pub async fn set_screen_name(&self, screen_name: &str) {
        self.session.write().await.screen_name = screen_name.to_string();
    }

    pub async fn connections(&self) -> Vec<Connection> {
        self.session.read().await.connections.clone()
    }

    pub async fn connection(&self, id: &str) -> Option<Connection> {
        if id.is_empty() {
            return None;
        }
        self.session
            .read()
            .await
            .connections
            .iter()
            .find(|connection| connection.id() == id)
            .cloned()
    }

    pub async fn replace_connections(&self, connections: Vec<Connection>) {
        tracing::debug!(count = connections.len(), "Connections replaced");
        self.session.write().await.connections = connections;
    }

    /// Event bus plugins subscribe on
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Publish an event on the current screen.
    pub async fn publish_event(&self, kind: EventKind) {
        let location = self.screen_name().await;
        self.events.publish(kind, &location).await;
    }

    /// Drop queued events that were published on another screen.
    pub async fn cleanup_events(&self) {
        let location = self.screen_name().await;
        self.events.cleanup(&location).await;
    }
}

/// Non-owning reference to the host's client session
#[derive(Debug, Clone, Default)]
pub struct ClientHandle(Weak<Client>);

impl ClientHandle {
    pub fn new(client: &Arc<Client>) -> Self {
        Self(Arc::downgrade(client))
    }

    /// A handle that points to no session
    pub fn detached() -> Self {
        Self(Weak::new())
    }

    /// The session, while the host still holds it
    pub fn upgrade(&self) -> Option<Arc<Client>> {
        self.0.upgrade()
    }

    pub fn is_attached(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Whether this handle points to `client`
    pub fn ptr_eq(&self, client: &Arc<Client>) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(client))
    }
}

/// Screen name for a page view: the `screenName` property, else `location`
/// (without a leading `/`), else the fallback title. `None` when no
/// properties were given, which leaves the current screen name unchanged.
pub fn resolve_screen_name(
    properties: Option<&HashMap<String, String>>,
    fallback_title: Option<&str>,
) -> Option<String> {
    let properties = properties?;

    let overrule = properties
        .get("screenName")
        .filter(|name| !name.is_empty())
        .or_else(|| properties.get("location"));

    match overrule {
        Some(name) => Some(name.strip_prefix('/').unwrap_or(name).to_string()),
        None => {
            let title = fallback_title.unwrap_or("");
            tracing::debug!(title = title, "No screenName in properties, using the title instead");
            Some(title.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Arc<Client> {
        Arc::new(Client::new(ClientConfig::new(
            "https://example.engage.io",
            "com.example.app",
        )))
    }

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_profile_values_round_through_cache() {
        let client = client();
        client.add_profile_value("hobbies", "tennis").await;
        client
            .add_profile_values("hobbies", &["soccer".to_string(), "tennis".to_string()])
            .await;
        assert_eq!(client.profile_value("hobbies").await, "tennis");
        assert_eq!(
            client.profile_values("hobbies").await,
            Some(vec!["tennis".to_string(), "soccer".to_string()])
        );

        client.set_profile_value("hobbies", "chess").await;
        assert_eq!(
            client.profile_values("hobbies").await,
            Some(vec!["chess".to_string()])
        );
    }

    #[tokio::test]
    async fn test_events_are_stamped_with_screen_name() {
        let client = client();
        client.set_screen_name("home").await;
        client
            .publish_event(EventKind::Click {
                selector: "#a".to_string(),
            })
            .await;
        client.set_screen_name("checkout").await;
        client
            .publish_event(EventKind::Click {
                selector: "#b".to_string(),
            })
            .await;

        let locations: Vec<String> = client
            .events()
            .queued()
            .await
            .iter()
            .map(|event| event.location().to_string())
            .collect();
        assert_eq!(locations, vec!["home".to_string(), "checkout".to_string()]);

        client.cleanup_events().await;
        let queued = client.events().queued().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].location(), "checkout");
    }

    #[tokio::test]
    async fn test_blank_profile_writes_are_ignored() {
        let client = client();
        client.profile_modified().await;
        client.add_profile_value("", "x").await;
        client.add_profile_value("a", "").await;
        client.set_profile_values("a", &[]).await;
        assert!(client.profile_properties().await.is_empty());
        assert!(!client.profile_modified().await);
    }

    #[tokio::test]
    async fn test_locale_defaults_to_config() {
        let mut config = ClientConfig::new("https://example.engage.io", "app");
        config.locale = Some("nl_NL".to_string());
        let client = Client::new(config);
        assert_eq!(client.locale().await.as_deref(), Some("nl_NL"));

        client.set_locale("en_US").await;
        assert_eq!(client.locale().await.as_deref(), Some("en_US"));
    }

    #[tokio::test]
    async fn test_connection_lookup() {
        let client = client();
        client
            .replace_connections(vec![
                Connection::new("a", HashMap::new()),
                Connection::new("b", HashMap::new()),
            ])
            .await;
        assert_eq!(client.connection("b").await.unwrap().id(), "b");
        assert!(client.connection("c").await.is_none());
        assert!(client.connection("").await.is_none());
    }

    #[tokio::test]
    async fn test_simulator_link_through_client() {
        let client = client();
        assert!(
            client
                .apply_simulator_link("com.example.app://sim.engage.io/jane/s1")
                .await
        );
        assert_eq!(client.config().await.host_name(), "https://sim.engage.io");
    }

    #[test]
    fn test_handle_tracks_host_lifetime() {
        let client = client();
        let handle = ClientHandle::new(&client);
        assert!(handle.is_attached());
        assert!(handle.ptr_eq(&client));
        assert!(!handle.ptr_eq(&self::client()));

        drop(client);
        assert!(!handle.is_attached());
        assert!(handle.upgrade().is_none());
    }

    #[test]
    fn test_detached_handle() {
        let handle = ClientHandle::detached();
        assert!(!handle.is_attached());
        assert!(handle.upgrade().is_none());
    }

    #[test]
    fn test_resolve_screen_name() {
        assert_eq!(resolve_screen_name(None, Some("Home")), None);
        assert_eq!(
            resolve_screen_name(Some(&props(&[("screenName", "Main/HOMETAB")])), None),
            Some("Main/HOMETAB".to_string())
        );
        assert_eq!(
            resolve_screen_name(Some(&props(&[("screenName", ""), ("location", "/shop")])), None),
            Some("shop".to_string())
        );
        assert_eq!(
            resolve_screen_name(Some(&props(&[("other", "x")])), Some("Home")),
            Some("Home".to_string())
        );
        assert_eq!(
            resolve_screen_name(Some(&props(&[])), None),
            Some(String::new())
        );
    }
}
