use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value type accepted as a UDF argument or return type in the mini
/// transform language. DuckDB's own type system is much richer; the
/// gateway exposes only this fixed, JSON-friendly subset at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Str,
    Int,
    Float,
    Bool,
}

impl Default for ValueType {
    fn default() -> Self {
        ValueType::Str
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueType::Str => "str",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" => Ok(ValueType::Str),
            "int" => Ok(ValueType::Int),
            "float" => Ok(ValueType::Float),
            "bool" => Ok(ValueType::Bool),
            other => Err(format!("unknown type '{other}'")),
        }
    }
}

/// A registered webhook: an ingress path bound to an optional filter, an
/// optional transform, and a destination to forward the (possibly
/// transformed) event to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDefinition {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub destination_url: String,
    pub filter_sql: Option<String>,
    pub transform_sql: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Request body for registering a new webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWebhookRequest {
    pub name: String,
    pub path: String,
    pub destination_url: String,
    pub filter_sql: Option<String>,
    pub transform_sql: Option<String>,
}

/// An operator-uploaded reference table, owned by a webhook and backed by
/// a physical DuckDB table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceTable {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub logical_name: String,
    pub physical_name: String,
    pub created_at: DateTime<Utc>,
}

/// A single argument of a registered UDF signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdfArg {
    pub name: String,
    pub arg_type: ValueType,
}

/// A user-defined function compiled from the mini transform language,
/// owned by a webhook, and registered with the embedded engine under a
/// physical name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdfDefinition {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub logical_name: String,
    pub physical_name: String,
    pub args: Vec<UdfArg>,
    pub return_type: ValueType,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for registering a new UDF under a webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUdfRequest {
    pub webhook_id: Uuid,
    pub logical_name: String,
    pub source: String,
}

/// The outcome of attempting to deliver a transformed event to its
/// destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Success,
    Failed,
    Filtered,
    Timeout,
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DispatchStatus::Success => "success",
            DispatchStatus::Failed => "failed",
            DispatchStatus::Filtered => "filtered",
            DispatchStatus::Timeout => "timeout",
        };
        write!(f, "{s}")
    }
}

/// A raw inbound event, recorded before any evaluation happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub source_path: String,
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

/// Destination response bodies are recorded for observability but capped so
/// a misbehaving destination can't bloat the audit log without bound.
pub const RESPONSE_BODY_CAPTURE_LIMIT: usize = 64 * 1024;

/// The result of evaluating and dispatching a raw event, recorded after
/// the dispatch attempt completes (or is skipped by a filter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedEvent {
    pub id: Uuid,
    pub raw_event_id: Uuid,
    pub webhook_id: Uuid,
    pub destination_url: String,
    pub transformed_payload: Option<serde_json::Value>,
    pub status: DispatchStatus,
    pub status_code: Option<u16>,
    /// Truncated to `RESPONSE_BODY_CAPTURE_LIMIT` bytes.
    pub response_body: Option<String>,
    pub error: Option<String>,
    pub dispatched_at: DateTime<Utc>,
}
