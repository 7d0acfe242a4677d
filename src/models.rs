//! Data models and structures
//!
//! Domain records produced by generation, each paired with the shape that is
//! sent to the model, plus environment configuration.

use crate::schema::Shape;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A record type that can be requested from the model.
pub trait Shaped: Sized {
    /// Shape of a single record.
    fn shape() -> Shape;

    /// Shape of a list of records.
    fn list_shape() -> Shape {
        Shape::array(Self::shape())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
    Team,
    Enterprise,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub role: String,
    pub bio: String,
    pub location: String,
    pub plan: Plan,
    pub joined_at: String,
}

impl Shaped for UserProfile {
    fn shape() -> Shape {
        Shape::object([
            ("name", Shape::string().describe("Full name")),
            ("email", Shape::string()),
            ("role", Shape::string().describe("Job title")),
            ("bio", Shape::string().describe("One or two sentences")),
            ("location", Shape::string()),
            ("plan", Shape::one_of(["free", "pro", "team", "enterprise"])),
            ("joined_at", Shape::string().describe("ISO 8601 date")),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub last_message: String,
    pub updated_at: String,
    pub unread_count: u32,
    pub pinned: bool,
}

impl Shaped for ChatSummary {
    fn shape() -> Shape {
        Shape::object([
            ("id", Shape::string()),
            ("title", Shape::string()),
            ("last_message", Shape::string()),
            ("updated_at", Shape::string().describe("ISO 8601 timestamp")),
            ("unread_count", Shape::integer()),
            ("pinned", Shape::boolean()),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: String,
}

impl Shaped for Message {
    fn shape() -> Shape {
        Shape::object([
            ("id", Shape::string()),
            ("sender", Shape::one_of(["user", "assistant"])),
            ("content", Shape::string()),
            ("timestamp", Shape::string().describe("ISO 8601 timestamp")),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CanvasKind {
    Whiteboard,
    Mindmap,
    Flowchart,
    Kanban,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Canvas {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: CanvasKind,
    pub node_count: u32,
    pub collaborators: Vec<String>,
    pub updated_at: String,
}

impl Shaped for Canvas {
    fn shape() -> Shape {
        Shape::object([
            ("id", Shape::string()),
            ("title", Shape::string()),
            ("description", Shape::string()),
            (
                "kind",
                Shape::one_of(["whiteboard", "mindmap", "flowchart", "kanban"]),
            ),
            ("node_count", Shape::integer()),
            (
                "collaborators",
                Shape::array(Shape::string()).describe("First names"),
            ),
            ("updated_at", Shape::string().describe("ISO 8601 timestamp")),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VaultNodeKind {
    Folder,
    Note,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaultNode {
    pub id: String,
    pub name: String,
    pub kind: VaultNodeKind,
    /// `None` for top-level nodes.
    #[serde(default)]
    pub parent_id: Option<String>,
    pub summary: String,
    pub tags: Vec<String>,
    pub size_bytes: u64,
}

impl Shaped for VaultNode {
    fn shape() -> Shape {
        Shape::object([
            ("id", Shape::string()),
            ("name", Shape::string()),
            ("kind", Shape::one_of(["folder", "note", "file"])),
            (
                "parent_id",
                Shape::string().describe("id of the containing folder; omit for top-level nodes"),
            ),
            ("summary", Shape::string()),
            ("tags", Shape::array(Shape::string())),
            ("size_bytes", Shape::integer()),
        ])
        .with_optional(&["parent_id"])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    Connected,
    Disconnected,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Integration {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub status: IntegrationStatus,
    pub last_synced_at: String,
}

impl Shaped for Integration {
    fn shape() -> Shape {
        Shape::object([
            ("id", Shape::string()),
            ("name", Shape::string().describe("Third-party product name")),
            (
                "category",
                Shape::one_of(["storage", "communication", "calendar", "crm", "developer"]),
            ),
            ("description", Shape::string()),
            ("status", Shape::one_of(["connected", "disconnected", "error"])),
            ("last_synced_at", Shape::string().describe("ISO 8601 timestamp")),
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub level: LogLevel,
    pub source: String,
    pub message: String,
}

/// Structured view of an unstructured log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogReport {
    pub summary: String,
    pub entries: Vec<LogEntry>,
}

impl Shaped for LogReport {
    fn shape() -> Shape {
        let entry = Shape::object([
            ("timestamp", Shape::string().describe("As written in the log")),
            (
                "level",
                Shape::one_of(["trace", "debug", "info", "warn", "error"]),
            ),
            ("source", Shape::string().describe("Component or logger name")),
            ("message", Shape::string()),
        ])
        .with_optional(&["timestamp"]);

        Shape::object([
            ("summary", Shape::string()),
            ("entries", Shape::array(entry)),
        ])
    }
}

// Configuration
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
    pub strict_shapes: bool,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY").unwrap_or_else(|| {
            tracing::warn!("GEMINI_API_KEY not set; requests will be rejected by the API");
            String::new()
        });

        let timeout_secs = match lookup("MOCKGEN_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(crate::Error::Config(format!(
                        "MOCKGEN_TIMEOUT_SECS must be a positive whole number of seconds, got '{}'",
                        raw
                    )))
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        let strict_shapes = match lookup("MOCKGEN_STRICT_SHAPES").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(crate::Error::Config(format!(
                    "MOCKGEN_STRICT_SHAPES must be true/false, got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            api_key,
            text_model: lookup("MOCKGEN_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: lookup("MOCKGEN_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            strict_shapes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_all_shapes_are_well_formed() {
        for shape in [
            UserProfile::shape(),
            ChatSummary::list_shape(),
            Message::list_shape(),
            Canvas::list_shape(),
            VaultNode::list_shape(),
            Integration::list_shape(),
            LogReport::shape(),
        ] {
            shape.validate().unwrap();
        }
    }

    #[test]
    fn test_vault_node_parent_is_optional() {
        let node: VaultNode = serde_json::from_value(json!({
            "id": "n1",
            "name": "Projects",
            "kind": "folder",
            "summary": "Top-level folder",
            "tags": [],
            "size_bytes": 0
        }))
        .unwrap();
        assert_eq!(node.parent_id, None);
        assert_eq!(node.kind, VaultNodeKind::Folder);
        assert!(VaultNode::shape()
            .check(&serde_json::to_value(&node).unwrap())
            .is_ok());
    }

    #[test]
    fn test_profile_shape_matches_record_fields() {
        let profile = UserProfile {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: "Analyst".to_string(),
            bio: "Writes notes on engines.".to_string(),
            location: "London".to_string(),
            plan: Plan::Pro,
            joined_at: "2024-03-01".to_string(),
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["plan"], json!("pro"));
        assert!(UserProfile::shape().check(&value).is_ok());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!config.strict_shapes);
    }

    #[test]
    fn test_config_missing_key_is_not_an_error() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_key, "");
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MOCKGEN_TEXT_MODEL", "gemini-2.5-pro"),
            ("MOCKGEN_TIMEOUT_SECS", "15"),
            ("MOCKGEN_STRICT_SHAPES", "true"),
        ]))
        .unwrap();
        assert_eq!(config.text_model, "gemini-2.5-pro");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.strict_shapes);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let err = Config::from_lookup(lookup_from(&[("MOCKGEN_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("MOCKGEN_STRICT_SHAPES", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let err =
            Config::from_lookup(lookup_from(&[("MOCKGEN_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
        assert!(err.to_string().contains("'0'"));
    }
}
