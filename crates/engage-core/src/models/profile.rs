//! In-memory profile property cache

use super::ParameterMap;

/// Profile properties known to the client, keyed by property name.
///
/// Every mutation raises the modified flag; `check_modified` reads and
/// resets it.
#[derive(Debug, Clone)]
pub struct ProfileCache {
    properties: ParameterMap,
    domain_group: Option<String>,
    modified: bool,
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileCache {
    pub fn new() -> Self {
        Self {
            properties: ParameterMap::new(),
            domain_group: None,
            modified: true,
        }
    }

    pub fn domain_group(&self) -> Option<&str> {
        self.domain_group.as_deref()
    }

    pub fn set_domain_group(&mut self, domain_group: impl Into<String>) {
        self.domain_group = Some(domain_group.into());
        self.modified = true;
    }

    /// First value of a property, or an empty string when it has none
    pub fn value(&self, name: &str) -> &str {
        self.properties
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.properties.get(name).map(Vec::as_slice)
    }

    pub fn properties(&self) -> &ParameterMap {
        &self.properties
    }

    /// Append values to a property, skipping values it already holds
    pub fn add(&mut self, name: &str, values: &[String]) {
        if name.is_empty() {
            return;
        }

        let existing = self.properties.entry(name.to_string()).or_default();
        for value in values {
            if !existing.contains(value) {
                existing.push(value.clone());
            }
        }
        self.modified = true;
    }

    /// Replace the values of a property; empty strings are dropped
    pub fn set(&mut self, name: &str, values: &[String]) {
        if name.is_empty() {
            return;
        }

        let filtered = values.iter().filter(|v| !v.is_empty()).cloned().collect();
        self.properties.insert(name.to_string(), filtered);
        self.modified = true;
    }

    pub fn clear(&mut self) {
        self.properties.clear();
        self.modified = true;
    }

    /// Return the modified flag and reset it
    pub fn check_modified(&mut self) -> bool {
        std::mem::replace(&mut self.modified, false)
    }
}
