use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{render_pairs, render_template, PushFormat, PushPair};
use crate::error::{MonitorError, Result};

const IOS_ENDPOINT: &str = "https://push.lolli.tech/v1/ios";
const IOS_APP_ID: &str = "com.lollipopkit.toolbox";
const SERVER_CHAN_ENDPOINT: &str = "https://sctapi.ftqq.com";
const BARK_SERVER: &str = "https://api.day.app";

/// Expected response of a push endpoint. Zero code and empty regex accept anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCheck {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub body_regex: String,
}

impl ResponseCheck {
    pub fn compile(&self) -> std::result::Result<Option<Regex>, regex::Error> {
        if self.body_regex.is_empty() {
            return Ok(None);
        }
        Regex::new(&self.body_regex).map(Some)
    }

    pub fn verify(&self, status: u16, body: &str) -> Result<()> {
        if self.code != 0 && status != self.code {
            return Err(MonitorError::push(format!(
                "unexpected status {} (want {}): {}",
                status, self.code, body
            )));
        }
        let regex = self
            .compile()
            .map_err(|e| MonitorError::push(format!("invalid body_regex: {}", e)))?;
        if let Some(regex) = regex {
            if !regex.is_match(body) {
                return Err(MonitorError::push(format!(
                    "response does not match {:?}: {}",
                    self.body_regex, body
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Arbitrary HTTP endpoint. String leaves of `body` are rendered as templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookChannel {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub body: Value,
    #[serde(flatten)]
    pub check: ResponseCheck,
}

impl WebhookChannel {
    /// Request body with every placeholder replaced.
    ///
    /// A JSON string body is sent verbatim, anything else is serialized.
    pub fn render_body(&self, name: &str, pairs: &[PushPair]) -> Option<String> {
        let msg = render_pairs(pairs);
        match render_value(&self.body, name, &msg) {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

fn render_value(value: &Value, name: &str, msg: &str) -> Value {
    match value {
        Value::String(s) => Value::String(render_template(s, name, msg)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| render_value(v, name, msg)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, name, msg)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// ServerBox iOS app push relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IosChannel {
    pub token: String,
    #[serde(default)]
    pub title: String,
    pub content: PushFormat,
    #[serde(flatten)]
    pub check: ResponseCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerChanChannel {
    pub sckey: String,
    #[serde(default)]
    pub title: String,
    pub desp: PushFormat,
    #[serde(flatten)]
    pub check: ResponseCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarkChannel {
    #[serde(default = "default_bark_server")]
    pub server: String,
    pub device_key: String,
    #[serde(default)]
    pub title: String,
    pub body: PushFormat,
    #[serde(flatten)]
    pub check: ResponseCheck,
}

fn default_bark_server() -> String {
    BARK_SERVER.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushChannel {
    Webhook(WebhookChannel),
    Ios(IosChannel),
    ServerChan(ServerChanChannel),
    Bark(BarkChannel),
}

impl PushChannel {
    pub fn check(&self) -> &ResponseCheck {
        match self {
            PushChannel::Webhook(c) => &c.check,
            PushChannel::Ios(c) => &c.check,
            PushChannel::ServerChan(c) => &c.check,
            PushChannel::Bark(c) => &c.check,
        }
    }

    /// Short human-readable target, used by `conf check`.
    pub fn describe(&self) -> String {
        match self {
            PushChannel::Webhook(c) => format!("{} {}", c.method.as_reqwest(), c.url),
            PushChannel::Ios(_) => IOS_ENDPOINT.to_string(),
            PushChannel::ServerChan(_) => format!("{}/<sckey>.send", SERVER_CHAN_ENDPOINT),
            PushChannel::Bark(c) => format!("{}/push", c.server.trim_end_matches('/')),
        }
    }

    /// Deliver `pairs` and verify the response.
    pub async fn send(
        &self,
        client: &reqwest::Client,
        name: &str,
        pairs: &[PushPair],
    ) -> Result<()> {
        let request = match self {
            PushChannel::Webhook(c) => {
                let mut request = client.request(c.method.as_reqwest(), &c.url);
                for (key, value) in &c.headers {
                    request = request.header(key.as_str(), value.as_str());
                }
                match c.render_body(name, pairs) {
                    Some(body) => request.body(body),
                    None => request,
                }
            }
            PushChannel::Ios(c) => client
                .post(IOS_ENDPOINT)
                .header("AppID", IOS_APP_ID)
                .json(&serde_json::json!({
                    "token": c.token,
                    "title": render_template(&c.title, name, ""),
                    "content": c.content.render(name, pairs),
                })),
            PushChannel::ServerChan(c) => client
                .get(format!("{}/{}.send", SERVER_CHAN_ENDPOINT, c.sckey))
                .query(&[
                    ("title", render_template(&c.title, name, "")),
                    ("desp", c.desp.render(name, pairs)),
                ]),
            PushChannel::Bark(c) => client
                .post(format!("{}/push", c.server.trim_end_matches('/')))
                .json(&serde_json::json!({
                    "device_key": c.device_key,
                    "title": render_template(&c.title, name, ""),
                    "body": c.body.render(name, pairs),
                })),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        log::debug!("Push response {}: {}", status, body);
        self.check().verify(status, &body)
    }
}
