//! Configuration binding for options types.
//!
//! A [`Configuration`] is a JSON tree assembled by [`ConfigurationBuilder`]
//! from files, strings, environment variables and literal values. Values are
//! addressed by colon-separated paths (`"database:pool:size"`).
//! [`ServiceCollection::configure`] exposes a section as a typed
//! [`Options<T>`] singleton.

use std::any::type_name;
use std::ops::Deref;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::collection::ServiceCollection;
use crate::error::{DiError, DiResult};
use crate::traits::Resolver;

/// Read-only configuration tree.
///
/// # Examples
///
/// ```
/// use scopewire::ConfigurationBuilder;
/// use serde_json::json;
///
/// let config = ConfigurationBuilder::new()
///     .add_json_str(r#"{"database": {"host": "localhost", "port": 5432}}"#)
///     .unwrap()
///     .add_value(json!({"database": {"port": 6432}}))
///     .build();
///
/// assert_eq!(config.get_str("database:host"), Some("localhost"));
/// assert_eq!(config.get("database:port"), Some(&json!(6432)));
/// assert!(config.get("database:user").is_none());
/// assert!(config.get_section("cache").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    root: Value,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl Configuration {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Value at a colon-separated `path`, or `None` if any segment is missing.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split(':')
            .try_fold(&self.root, |current, segment| current.as_object()?.get(segment))
    }

    /// String value at `path`.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Sub-tree at `path`. Missing or non-object values yield an empty section.
    pub fn get_section(&self, path: &str) -> Configuration {
        match self.get(path) {
            Some(value) if value.is_object() => Configuration::new(value.clone()),
            _ => Configuration::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.root {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Deserialises the whole tree into `T`.
    ///
    /// camelCase keys are matched to snake_case fields; keys with no matching
    /// field are ignored unless `T` denies unknown fields.
    pub fn bind<T: DeserializeOwned>(&self) -> DiResult<T> {
        serde_json::from_value(snake_case_keys(&self.root))
            .map_err(|e| DiError::Config(format!("cannot bind {}: {}", type_name::<T>(), e)))
    }
}

/// Merges configuration sources; later sources override earlier ones.
///
/// Objects merge key by key, any other value replaces what was there.
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    root: Map<String, Value>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a JSON file. A missing file is skipped.
    ///
    /// # Errors
    ///
    /// [`DiError::Config`] if the file exists but cannot be read or parsed.
    pub fn add_json_file(self, path: impl AsRef<Path>) -> DiResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "configuration file not found; skipping");
            return Ok(self);
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| DiError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| DiError::Config(format!("invalid JSON in {}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "configuration file loaded");
        self.add_object(value)
    }

    /// Merges a JSON document, which must be an object.
    pub fn add_json_str(self, json: &str) -> DiResult<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| DiError::Config(format!("invalid JSON: {}", e)))?;
        self.add_object(value)
    }

    fn add_object(self, value: Value) -> DiResult<Self> {
        if !value.is_object() {
            return Err(DiError::Config("configuration root must be a JSON object".into()));
        }
        Ok(self.add_value(value))
    }

    /// Merges environment variables starting with `prefix` (prefix removed).
    ///
    /// `__` in a name nests the key (`APP_DB__HOST` with prefix `APP_` sets
    /// `DB:HOST`). Values that parse as JSON scalars (numbers, booleans) keep
    /// that type; everything else is a string. An empty prefix imports every
    /// variable.
    pub fn add_env_variables(mut self, prefix: &str) -> Self {
        for (name, raw) in std::env::vars() {
            let Some(stripped) = name.strip_prefix(prefix) else {
                continue;
            };
            if stripped.is_empty() {
                continue;
            }

            let mut segments: Vec<&str> = stripped.split("__").collect();
            let head = segments.remove(0);
            let mut value = parse_scalar(raw);
            for segment in segments.into_iter().rev() {
                let mut map = Map::new();
                map.insert(segment.to_string(), value);
                value = Value::Object(map);
            }
            merge_entry(&mut self.root, head.to_string(), value);
        }
        self
    }

    /// Merges a literal value. Non-object values are ignored.
    pub fn add_value(mut self, value: Value) -> Self {
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    merge_entry(&mut self.root, key, value);
                }
            }
            other => tracing::debug!(value = %other, "ignoring non-object configuration value"),
        }
        self
    }

    pub fn build(self) -> Configuration {
        Configuration::new(Value::Object(self.root))
    }
}

fn merge_entry(target: &mut Map<String, Value>, key: String, value: Value) {
    match (target.get_mut(&key), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                merge_entry(existing, k, v);
            }
        }
        (Some(slot), value) => *slot = value,
        (None, value) => {
            target.insert(key, value);
        }
    }
}

fn parse_scalar(raw: String) -> Value {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw),
    }
}

/// `camelCase` to `snake_case`: each capital becomes `_` plus its lowercase.
fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out.trim_start_matches('_').to_string()
}

fn snake_case_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (to_snake_case(k), snake_case_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(snake_case_keys).collect()),
        other => other.clone(),
    }
}

/// A bound options value, registered by [`ServiceCollection::configure`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options<T> {
    value: T,
}

impl<T> Options<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Options<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl ServiceCollection {
    /// Registers `Options<T>` bound from `section` of the registered
    /// [`Configuration`] (an empty `section` binds the whole tree).
    ///
    /// Binding is lazy: it runs on first resolution and the result is a
    /// singleton. Add `#[serde(default)]` to `T` so absent keys keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Resolving `Options<T>` fails with [`DiError::NotFound`] naming
    /// `Configuration` when none is registered, and with [`DiError::Config`]
    /// when the section cannot be bound.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{ConfigurationBuilder, Options, Resolver, ServiceCollection};
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, Default, Deserialize)]
    /// #[serde(default)]
    /// struct DatabaseOptions {
    ///     connection_string: String,
    ///     max_pool_size: u32,
    /// }
    ///
    /// let config = ConfigurationBuilder::new()
    ///     .add_json_str(r#"{"database": {"connectionString": "postgres://db", "maxPoolSize": 8}}"#)
    ///     .unwrap()
    ///     .build();
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(config);
    /// services.configure::<DatabaseOptions>("database");
    ///
    /// let provider = services.build();
    /// let options = provider.get_required::<Options<DatabaseOptions>>();
    /// assert_eq!(options.connection_string, "postgres://db");
    /// assert_eq!(options.max_pool_size, 8);
    /// ```
    pub fn configure<T>(&mut self, section: &str) -> &mut Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let section = section.to_string();
        self.add_singleton_factory::<Options<T>, _>(move |resolver| {
            let config = resolver.get::<Configuration>()?;
            let value = if section.is_empty() {
                config.bind::<T>()?
            } else {
                config.get_section(&section).bind::<T>()?
            };
            tracing::debug!(options = type_name::<T>(), section = %section, "options bound");
            Ok(Options::new(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snake_case_conversion_matches_capital_rule() {
        assert_eq!(to_snake_case("connectionString"), "connection_string");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("Port"), "port");
    }

    #[test]
    fn merge_is_deep_for_objects_only() {
        let config = ConfigurationBuilder::new()
            .add_value(json!({"a": {"x": 1, "y": 2}, "list": [1, 2]}))
            .add_value(json!({"a": {"y": 3}, "list": [9]}))
            .build();
        assert_eq!(config.get("a:x"), Some(&json!(1)));
        assert_eq!(config.get("a:y"), Some(&json!(3)));
        assert_eq!(config.get("list"), Some(&json!([9])));
    }

    #[test]
    fn path_through_scalar_is_none() {
        let config = Configuration::new(json!({"a": 1}));
        assert!(config.get("a:b").is_none());
        assert!(config.get_section("a").is_empty());
    }

    #[test]
    fn scalars_parse_from_env_strings() {
        assert_eq!(parse_scalar("8080".into()), json!(8080));
        assert_eq!(parse_scalar("true".into()), json!(true));
        assert_eq!(parse_scalar("localhost".into()), json!("localhost"));
        assert_eq!(parse_scalar("[1]".into()), json!("[1]"));
    }

    #[test]
    fn non_object_json_is_rejected() {
        let err = ConfigurationBuilder::new().add_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, DiError::Config(_)));
    }
}
