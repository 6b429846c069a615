//! Configuration module
//!
//! Client configuration loaded from the environment: the Engage server URL,
//! the application identifier, debug mode and the preferred locale. Also
//! handles simulator deep links, which override the host and attach the
//! simulator session to the client.

use std::env;

const DEFAULT_APP_ID: &str = "engage-app";
const DEFAULT_DOMAIN_GROUP: &str = "DEFAULT";

/// Simulator session attached through a deep link
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulatorSession {
    pub user_name: String,
    pub mobile_session_id: String,
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub server_url: String,
    pub app_id: String,
    pub debug_mode: bool,
    pub locale: Option<String>,
    host_override: Option<String>,
    simulator: Option<SimulatorSession>,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            server_url: trim_trailing_slash(server_url.into()),
            app_id: app_id.into(),
            debug_mode: false,
            locale: None,
            host_override: None,
            simulator: None,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup("ENGAGE_SERVER_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("ENGAGE_SERVER_URL must be set"))?;

        let app_id = lookup("ENGAGE_APP_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_APP_ID.to_string());

        let debug_mode = lookup("ENGAGE_DEBUG")
            .unwrap_or_else(|| "false".to_string())
            .to_lowercase()
            .parse()
            .unwrap_or(false);

        let locale = lookup("ENGAGE_LOCALE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let config = Self {
            debug_mode,
            locale,
            ..Self::new(server_url, app_id)
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.server_url.starts_with("https://") || self.server_url.starts_with("http://")) {
            return Err(anyhow::anyhow!(
                "ENGAGE_SERVER_URL must start with http:// or https:// (got '{}')",
                self.server_url
            ));
        }
        Ok(())
    }

    /// Host name requests go to; a simulator link overrides the configured URL.
    pub fn host_name(&self) -> &str {
        self.host_override.as_deref().unwrap_or(&self.server_url)
    }

    pub fn simulator(&self) -> Option<&SimulatorSession> {
        self.simulator.as_ref()
    }

    /// URL of the RPC endpoint for a domain group
    pub fn domain_group_url(&self, domain_group: Option<&str>) -> String {
        format!(
            "{}/DG/{}/rest/rpc/?",
            self.host_name(),
            domain_group.unwrap_or(DEFAULT_DOMAIN_GROUP)
        )
    }

    /// Apply a simulator deep link of the form `<app_id>://<host>/<user>/<session>`.
    ///
    /// Any host in the link becomes the new host name. The simulator session is
    /// only recorded when the scheme matches the app id (case-insensitive) and
    /// the path holds exactly a user and a session segment. Returns whether a
    /// session was recorded.
    pub fn apply_simulator_link(&mut self, url: &str) -> bool {
        let Some((scheme, rest)) = url.split_once("://") else {
            tracing::debug!(url = url, "Simulator link has no scheme");
            return false;
        };

        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        if !host.is_empty() {
            self.host_override = Some(format!("https://{}", host));
        }

        if !scheme.eq_ignore_ascii_case(&self.app_id) {
            tracing::debug!(scheme = scheme, app_id = %self.app_id, "Simulator link scheme does not match app id");
            return false;
        }

        let segments: Vec<&str> = path.split('/').collect();
        if let [_, user, session] = segments.as_slice() {
            tracing::info!(user = %user, host = host, "Connected to simulator");
            self.simulator = Some(SimulatorSession {
                user_name: user.to_string(),
                mobile_session_id: session.to_string(),
            });
            return true;
        }

        false
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    if url.ends_with('/') {
        url.pop();
    }
    url
}
