use std::collections::HashMap;
use std::str::FromStr;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;
use crate::TimerKind;

/// Title/body copy for one timer kind.
///
/// Both strings accept the `{label}` and `{kind}` placeholders.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    pub title: String,
    pub body: String,
}

/// Notification payload configuration
///
/// ```toml
/// [notification.templates.wash]
/// title = "Washer finished"
/// body = "{label}'s load is clean."
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Per-kind overrides of the built-in copy, keyed by kind name
    #[serde(default)]
    pub templates: HashMap<String, TemplateConfig>,

    /// Label used when a timer was started without one.
    /// Empty means "use the owner id".
    #[serde(default)]
    pub default_label: String,
}
impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            templates: HashMap::new(),
            default_label: String::new(),
        }
    }
}
impl NotificationConfig {
    pub fn validate(&self) -> Result<()> {
        for (kind, template) in &self.templates {
            if TimerKind::from_str(kind).is_err() {
                return Err(Error::Config(ConfigError::Message(format!(
                    "notification.templates has unknown kind {kind}"
                ))));
            }
            if template.title.trim().is_empty() {
                return Err(Error::Config(ConfigError::Message(format!(
                    "notification.templates.{kind}.title cannot be empty"
                ))));
            }
        }
        Ok(())
    }
}
