use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

// ============ Record Models ============

/// Names of the intake form fields, as they appear in the persisted document.
pub mod fields {
    pub const ID: &str = "id";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const AGE: &str = "age";
    pub const WORK_EXPERIENCE: &str = "work_experience";
    pub const CANADA_WORKEX: &str = "canada_workex";
    pub const READING_ENGLISH_SCALE: &str = "reading_english_scale";
    pub const SPEAKING_ENGLISH_SCALE: &str = "speaking_english_scale";
    pub const WRITING_ENGLISH_SCALE: &str = "writing_english_scale";
    pub const NUMERACY_SCALE: &str = "numeracy_scale";
    pub const COMPUTER_SCALE: &str = "computer_scale";
    pub const FELONY: &str = "felony_bool";
    pub const SUBSTANCE_USE: &str = "substance_use";
    pub const MENTAL_HEALTH_SUPPORT: &str = "need_mental_health_support_bool";
    pub const TRANSPORTATION: &str = "transportation_bool";
    pub const CURRENTLY_EMPLOYED: &str = "currently_employed";
    pub const LAST_UPDATE: &str = "last_update";
}

/// Fields a client may never overwrite through a submission or a partial update.
///
/// `id` is assigned by the store and `last_update` is stamped by it on every edit.
pub const PROTECTED_FIELDS: [&str; 2] = [fields::ID, fields::LAST_UPDATE];

/// Yes/no answer as read from a record.
///
/// The intake document carries these as the strings `"true"` / `"false"`.
/// Reading is lenient: any casing of `"true"` or a native `true` counts as
/// set, anything else (including a missing field) as not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flag {
    True,
    #[default]
    False,
}

impl Flag {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(b)) => Flag::from(*b),
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("true") => Flag::True,
            _ => Flag::False,
        }
    }

    pub fn is_true(self) -> bool {
        matches!(self, Flag::True)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Flag::True => "true",
            Flag::False => "false",
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Flag::True
        } else {
            Flag::False
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Always written in the document's string convention.
impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One client's intake and assessment data.
///
/// Stored exactly as submitted: the API never type-checks or normalises the
/// fields, so a value the form sends in an unexpected shape round-trips
/// unchanged. Typed reads go through the accessors below, which fall back
/// to "absent" instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientRecord(Map<String, Value>);

impl ClientRecord {
    /// Builds a new record from submitted fields, dropping [`PROTECTED_FIELDS`].
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        for key in PROTECTED_FIELDS {
            fields.remove(key);
        }
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Identifier assigned by the store. Absent only in hand-edited documents.
    pub fn id(&self) -> Option<&str> {
        self.get(fields::ID).and_then(Value::as_str)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.get(fields::FIRST_NAME).and_then(Value::as_str)
    }

    /// Time of the last partial update; `None` until the first edit or when
    /// the stored value is not an RFC 3339 timestamp.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.get(fields::LAST_UPDATE)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Reads a numeric field leniently.
    ///
    /// Numbers and numeric strings are accepted; fractions are truncated toward
    /// zero. Missing, empty or non-numeric values read as `None`.
    pub fn count(&self, field: &str) -> Option<i64> {
        match self.get(field)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
            Value::String(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate))
            }
            _ => None,
        }
    }

    pub fn flag(&self, field: &str) -> Flag {
        Flag::from_value(self.get(field))
    }

    /// Overlays `patch` onto the record, keeping [`PROTECTED_FIELDS`] untouched.
    ///
    /// Values are stored as given, `null` included.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if PROTECTED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Case-insensitive exact comparison against the first name.
    pub fn first_name_matches(&self, name: &str) -> bool {
        self.first_name()
            .map(|first| first.to_lowercase() == name.to_lowercase())
            .unwrap_or(false)
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.0.insert(fields::ID.to_string(), Value::String(id));
    }

    pub(crate) fn set_last_update(&mut self, at: DateTime<Utc>) {
        self.0.insert(
            fields::LAST_UPDATE.to_string(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }

    pub(crate) fn clear_last_update(&mut self) {
        self.0.remove(fields::LAST_UPDATE);
    }
}

impl From<Map<String, Value>> for ClientRecord {
    /// Wraps a stored record verbatim, protected fields included.
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn truncate(n: f64) -> Option<i64> {
    if n.is_finite() && n.abs() < i64::MAX as f64 {
        Some(n.trunc() as i64)
    } else {
        None
    }
}

// ============ API Models ============

/// Query parameters for `GET /api/clients/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
}

/// Response body of `POST /api/submit-form`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub message: String,
    pub submission: ClientRecord,
}

/// Response body of `PUT /api/update-user/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Echo of the fields the client sent.
    #[serde(rename = "updatedData")]
    pub updated_data: Map<String, Value>,
}

/// Response body of `DELETE /api/delete-user/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// A suggested program and its projected impact, serialised as `[impact, [labels]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention(pub f64, pub Vec<String>);

impl Intervention {
    pub fn impact(&self) -> f64 {
        self.0
    }

    pub fn labels(&self) -> &[String] {
        &self.1
    }
}

/// Result of the return-to-work scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkScore {
    /// Heuristic likelihood in `0..=100`.
    pub baseline: u8,
    pub interventions: Vec<Intervention>,
}
