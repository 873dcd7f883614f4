//! Notification payloads and the channels that deliver them.

mod channels;
mod dispatcher;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MonitorError, Result};

pub use channels::{
    BarkChannel, HttpMethod, IosChannel, PushChannel, ResponseCheck, ServerChanChannel,
    WebhookChannel,
};
pub use dispatcher::Dispatcher;

/// Replaced by the configured server name.
pub const NAME_PLACEHOLDER: &str = "{{name}}";
/// Replaced by the rendered pairs.
pub const MSG_PLACEHOLDER: &str = "{{msg}}";
/// Older spelling of [`MSG_PLACEHOLDER`].
pub const KVS_PLACEHOLDER: &str = "{{kvs}}";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One fired rule, ready to be rendered into a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushPair {
    pub key: String,
    pub value: String,
    /// Local time the rule fired.
    pub time: String,
}

impl PushPair {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            time: chrono::Local::now().format(TIME_FORMAT).to_string(),
        }
    }
}

/// `"<time>\n<key>: <value>"` per pair, joined by newlines.
pub fn render_pairs(pairs: &[PushPair]) -> String {
    pairs
        .iter()
        .map(|p| format!("{}\n{}: {}", p.time, p.key, p.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A text template with `{{name}}`, `{{msg}}` and `{{kvs}}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushFormat(pub String);

impl PushFormat {
    pub fn new<S: Into<String>>(template: S) -> Self {
        Self(template.into())
    }

    pub fn render(&self, name: &str, pairs: &[PushPair]) -> String {
        render_template(&self.0, name, &render_pairs(pairs))
    }
}

pub(crate) fn render_template(template: &str, name: &str, msg: &str) -> String {
    template
        .replace(NAME_PLACEHOLDER, name)
        .replace(MSG_PLACEHOLDER, msg)
        .replace(KVS_PLACEHOLDER, msg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushType {
    Webhook,
    Ios,
    ServerChan,
    Bark,
}

impl PushType {
    pub fn name(self) -> &'static str {
        match self {
            PushType::Webhook => "webhook",
            PushType::Ios => "ios",
            PushType::ServerChan => "server_chan",
            PushType::Bark => "bark",
        }
    }
}

impl std::fmt::Display for PushType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured push target. `iface` holds the type-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Push {
    #[serde(rename = "type")]
    pub push_type: PushType,
    pub name: String,
    pub iface: Value,
}

impl Push {
    pub fn new(push_type: PushType, name: &str, iface: Value) -> Self {
        Self {
            push_type,
            name: name.to_string(),
            iface,
        }
    }

    /// Decode `iface` according to `type`.
    pub fn channel(&self) -> Result<PushChannel> {
        let iface = self.iface.clone();
        let channel = match self.push_type {
            PushType::Webhook => PushChannel::Webhook(serde_json::from_value(iface)?),
            PushType::Ios => PushChannel::Ios(serde_json::from_value(iface)?),
            PushType::ServerChan => PushChannel::ServerChan(serde_json::from_value(iface)?),
            PushType::Bark => PushChannel::Bark(serde_json::from_value(iface)?),
        };
        channel.check().compile().map_err(|e| {
            MonitorError::push(format!("{}: invalid body_regex: {}", self.name, e))
        })?;
        Ok(channel)
    }
}
