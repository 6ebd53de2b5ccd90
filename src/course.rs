//! Course records and the schema handed to the extraction service.

use crate::utils::normalize_key;
use crate::ExtractorError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields the extraction service is asked to fill, in display order.
pub const COURSE_FIELDS: [&str; 7] = [
    "course_name",
    "level",
    "fees",
    "intake_date",
    "requirements",
    "description",
    "duration",
];

/// Natural-language instruction sent along with every extraction request.
pub const COURSE_PROMPT: &str = "Extract full details of this course: course name, level, \
    fees (UK and International if available), intake / year of entry, entry requirements, \
    full description, duration. Return a structured object with these fields.";

/// One university course offering as returned by the extraction service.
///
/// Keys the service returns beyond the known fields (for example `university`
/// or `degree_type`) are kept in `extra` and written back out on export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub source_url: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CourseRecord {
    pub fn new(course_name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            course_name: Some(course_name.into()),
            source_url: source_url.into(),
            ..Default::default()
        }
    }

    /// Build a record from one item of the service payload.
    ///
    /// Returns `None` when the item is not a JSON object. Known fields are
    /// coerced to text, `null` and blank strings become absent, and any
    /// `source_url` in the payload is replaced by `source_url`.
    pub fn from_value(value: Value, source_url: &str) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };

        let mut take = |key: &str| map.remove(key).and_then(value_to_text);
        let mut record = Self {
            course_name: take("course_name"),
            level: take("level"),
            fees: take("fees"),
            intake_date: take("intake_date"),
            requirements: take("requirements"),
            description: take("description"),
            duration: take("duration"),
            source_url: source_url.to_string(),
            extra: BTreeMap::new(),
        };

        map.remove("source_url");
        record.extra = map.into_iter().collect();
        Some(record)
    }

    /// Case-insensitive, trimmed course name. `None` when the name is missing or blank.
    pub fn dedup_key(&self) -> Option<String> {
        self.course_name
            .as_deref()
            .map(normalize_key)
            .filter(|key| !key.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.course_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Course")
    }

    pub fn university(&self) -> Option<&str> {
        self.extra_str("university")
    }

    pub fn degree_type(&self) -> Option<&str> {
        self.extra_str("degree_type")
    }

    /// Value of a known field by its JSON key.
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "course_name" => self.course_name.as_deref(),
            "level" => self.level.as_deref(),
            "fees" => self.fees.as_deref(),
            "intake_date" => self.intake_date.as_deref(),
            "requirements" => self.requirements.as_deref(),
            "description" => self.description.as_deref(),
            "duration" => self.duration.as_deref(),
            "source_url" => Some(self.source_url.as_str()),
            _ => self.extra_str(key),
        }
    }

    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other @ (Value::Array(_) | Value::Object(_)) => Some(other.to_string()),
    }
}

/// Shape of the object the extraction service is asked to return.
#[derive(JsonSchema)]
#[allow(dead_code)]
struct CourseSchema {
    /// Title of the course / programme
    course_name: String,
    /// Undergraduate, Postgraduate, Diploma, etc.
    level: Option<String>,
    /// Fees or cost info
    fees: Option<String>,
    /// Next intake or start date
    intake_date: Option<String>,
    /// Entry requirements or prerequisites
    requirements: Option<String>,
    /// Course description / overview
    description: Option<String>,
    /// Course duration
    duration: Option<String>,
}

/// JSON schema sent with every extraction request. Only `course_name` is required.
pub fn course_schema() -> Result<Value, ExtractorError> {
    let schema = schemars::schema_for!(CourseSchema);
    let mut value = serde_json::to_value(&schema)?;
    if let Some(obj) = value.as_object_mut() {
        // the service rejects meta keys it does not understand
        obj.remove("$schema");
    }
    Ok(value)
}

/// Split a payload into its object items: arrays are flattened one level, a lone object is one item.
pub fn payload_items(data: Value) -> Vec<Map<String, Value>> {
    let items = match data {
        Value::Array(items) => items,
        other => vec![other],
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}
