use std::collections::BTreeMap;
use std::fmt;

/// Built-in external verb to device verb table
const BUILTIN_TRANSLATIONS: &[(&str, &str)] = &[
    ("window_open", "OPEN"),
    ("window_close", "CLOSE"),
    ("light_on", "CMD_LIGHT_ON"),
    ("light_off", "CMD_LIGHT_OFF"),
    ("door_open", "CMD_DOOR_OPEN"),
    ("door_close", "CMD_DOOR_CLOSE"),
];

/// Device-native verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand(String);

impl DeviceCommand {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for DeviceCommand {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Exact-match translation table
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    table: BTreeMap<String, String>,
}

impl CommandTranslator {
    /// Translator holding only the built-in table
    pub fn builtin() -> Self {
        let table = BUILTIN_TRANSLATIONS
            .iter()
            .map(|(external, device)| (external.to_string(), device.to_string()))
            .collect();
        Self { table }
    }

    /// Add or replace one entry
    pub fn with_entry(mut self, external: impl Into<String>, device: impl Into<String>) -> Self {
        self.table.insert(external.into(), device.into());
        self
    }

    /// Add or replace every entry of `entries`
    pub fn with_entries<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.table
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn translate(&self, external: &str) -> Option<DeviceCommand> {
        self.table.get(external).cloned().map(DeviceCommand)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for CommandTranslator {
    fn default() -> Self {
        Self::builtin()
    }
}
