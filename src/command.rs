//! Inlets and the typed commands they produce.
//!
//! Each inlet is a named, typed channel on the messaging connection:
//!
//! | Inlet        | Type    | Command             |
//! |--------------|---------|---------------------|
//! | `img_urls`   | string  | `AddImage(url)`     |
//! | `next`       | boolean | `Next`              |
//! | `prev`       | boolean | `Prev`              |
//! | `play_pause` | boolean | `TogglePlayPause`   |
//! | `speed`      | range   | `SetSpeed(value)`   |
//!
//! Boolean payloads are edge triggers: the value itself is ignored.

use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InletType {
    String,
    Boolean,
    Range,
}

impl InletType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InletType::String => "string",
            InletType::Boolean => "boolean",
            InletType::Range => "range",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inlet {
    ImgUrls,
    Next,
    Prev,
    PlayPause,
    Speed,
}

impl Inlet {
    pub const ALL: [Inlet; 5] = [Inlet::ImgUrls, Inlet::Next, Inlet::Prev, Inlet::PlayPause, Inlet::Speed];

    pub fn name(&self) -> &'static str {
        match self {
            Inlet::ImgUrls => "img_urls",
            Inlet::Next => "next",
            Inlet::Prev => "prev",
            Inlet::PlayPause => "play_pause",
            Inlet::Speed => "speed",
        }
    }

    pub fn kind(&self) -> InletType {
        match self {
            Inlet::ImgUrls => InletType::String,
            Inlet::Next | Inlet::Prev | Inlet::PlayPause => InletType::Boolean,
            Inlet::Speed => InletType::Range,
        }
    }

    pub fn from_name(name: &str) -> Option<Inlet> {
        Inlet::ALL.into_iter().find(|i| i.name() == name)
    }
}

/// Subscription manifest entry
#[derive(Debug, Clone, Serialize)]
pub struct InletInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: InletType,
}

pub fn manifest() -> Vec<InletInfo> {
    Inlet::ALL
        .iter()
        .map(|i| InletInfo {
            name: i.name(),
            kind: i.kind(),
        })
        .collect()
}

/// Everything the application loop can be asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddImage(String),
    Next,
    Prev,
    TogglePlayPause,
    SetSpeed(i64),
    Clear,
    Resize { width: u32, height: u32 },
}

impl Command {
    /// Build the command for a payload delivered to `inlet`.
    pub fn from_inlet(inlet: Inlet, value: &Value) -> Result<Command> {
        match inlet {
            Inlet::ImgUrls => {
                let url = match value {
                    Value::String(s) => s.trim(),
                    other => bail!("img_urls expects a string, got {}", other),
                };
                if url.is_empty() {
                    bail!("img_urls payload is empty");
                }
                Ok(Command::AddImage(url.to_string()))
            }
            Inlet::Next => Ok(Command::Next),
            Inlet::Prev => Ok(Command::Prev),
            Inlet::PlayPause => Ok(Command::TogglePlayPause),
            Inlet::Speed => Ok(Command::SetSpeed(parse_range(value)?)),
        }
    }

    /// Build the command for a pub/sub envelope:
    /// `{"message": {"name": "speed", "type": "range", "value": "500"}}`.
    /// A `type` that disagrees with the inlet's type is rejected.
    pub fn from_envelope(envelope: &Value) -> Result<Command> {
        let message = envelope.get("message").unwrap_or(envelope);
        let name = message
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("message has no name"))?;
        let inlet = Inlet::from_name(name).ok_or_else(|| anyhow!("unknown inlet '{}'", name))?;

        if let Some(kind) = message.get("type").and_then(Value::as_str) {
            if kind != inlet.kind().as_str() {
                bail!("inlet '{}' is {}, message is {}", name, inlet.kind().as_str(), kind);
            }
        }

        let value = message.get("value").unwrap_or(&Value::Null);
        Command::from_inlet(inlet, value)
    }
}

/// Payload of a range inlet: a number or a numeric string, rounded.
fn parse_range(value: &Value) -> Result<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n.round() as i64),
        _ => bail!("range expects a number, got {}", value),
    }
}

/// Interpret a raw inlet body: JSON if it parses (unwrapping `{"value": ..}`), plain text otherwise.
pub fn parse_body(body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut map)) if map.contains_key("value") => map.remove("value").unwrap_or(Value::Null),
        Ok(value) => value,
        Err(_) => Value::String(body.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inlet_names_round_trip() {
        for inlet in Inlet::ALL {
            assert_eq!(Inlet::from_name(inlet.name()), Some(inlet));
        }
        assert_eq!(Inlet::from_name("volume"), None);
    }

    #[test]
    fn test_boolean_payload_ignored() {
        assert_eq!(Command::from_inlet(Inlet::Next, &json!(false)).unwrap(), Command::Next);
        assert_eq!(Command::from_inlet(Inlet::Prev, &json!("true")).unwrap(), Command::Prev);
        assert_eq!(
            Command::from_inlet(Inlet::PlayPause, &Value::Null).unwrap(),
            Command::TogglePlayPause
        );
    }

    #[test]
    fn test_img_urls() {
        assert_eq!(
            Command::from_inlet(Inlet::ImgUrls, &json!(" http://a.com/x.png ")).unwrap(),
            Command::AddImage("http://a.com/x.png".into())
        );
        assert!(Command::from_inlet(Inlet::ImgUrls, &json!("")).is_err());
        assert!(Command::from_inlet(Inlet::ImgUrls, &json!(5)).is_err());
    }

    #[test]
    fn test_speed_parsing() {
        assert_eq!(Command::from_inlet(Inlet::Speed, &json!(500)).unwrap(), Command::SetSpeed(500));
        assert_eq!(Command::from_inlet(Inlet::Speed, &json!("250")).unwrap(), Command::SetSpeed(250));
        assert_eq!(Command::from_inlet(Inlet::Speed, &json!(99.6)).unwrap(), Command::SetSpeed(100));
        // Out of range is clamped later, not rejected here
        assert_eq!(Command::from_inlet(Inlet::Speed, &json!(1023)).unwrap(), Command::SetSpeed(1023));
        assert!(Command::from_inlet(Inlet::Speed, &json!("fast")).is_err());
    }

    #[test]
    fn test_envelope() {
        let env = json!({"message": {"clientName": "remote", "name": "speed", "type": "range", "value": "700"}});
        assert_eq!(Command::from_envelope(&env).unwrap(), Command::SetSpeed(700));

        let bare = json!({"name": "next", "value": "true"});
        assert_eq!(Command::from_envelope(&bare).unwrap(), Command::Next);

        let wrong_type = json!({"message": {"name": "speed", "type": "string", "value": "1"}});
        assert!(Command::from_envelope(&wrong_type).is_err());
        assert!(Command::from_envelope(&json!({"message": {"name": "nope"}})).is_err());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body("http://a.com/x.png\n"), json!("http://a.com/x.png"));
        assert_eq!(parse_body("512"), json!(512));
        assert_eq!(parse_body(r#"{"value": "on"}"#), json!("on"));
        assert_eq!(parse_body(r#""quoted""#), json!("quoted"));
    }

    #[test]
    fn test_manifest() {
        let m = serde_json::to_value(manifest()).unwrap();
        assert_eq!(m[4], json!({"name": "speed", "type": "range"}));
    }
}
