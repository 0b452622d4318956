// Raw report records: classification of untyped wire records.
//
// The report endpoints have shipped two field layouts over time: the
// current snake_case one (`reporter_id`, `report_reason`, `admin_notes`,
// `status`) and a legacy camelCase one (`reporterId`, `reason`,
// `adminMessage`, `reviewed`). A record is classified exactly once, here,
// and everything downstream matches on the resulting variant instead of
// probing field names again.

use serde_json::{Map, Value};

/// Identity and naming fields for one side of a report (reporter or reported).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectFields {
    pub id: Option<String>,
    /// Explicit username field (`*_username`).
    pub username: Option<String>,
    /// Legacy `*Name` field, which the old API filled with the username.
    pub legacy_name: Option<String>,
    /// Human display name (`*_name`).
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl SubjectFields {
    /// Fill every missing field from `fallback`.
    pub fn or(self, fallback: SubjectFields) -> SubjectFields {
        SubjectFields {
            id: self.id.or(fallback.id),
            username: self.username.or(fallback.username),
            legacy_name: self.legacy_name.or(fallback.legacy_name),
            display_name: self.display_name.or(fallback.display_name),
            email: self.email.or(fallback.email),
        }
    }
}

/// Every canonical slot a raw record can fill, all optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    pub id: Option<String>,
    pub reporter: SubjectFields,
    pub reported: SubjectFields,
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub reason: Option<String>,
    pub description: Option<String>,
    pub report_date: Option<String>,
    pub status: Option<String>,
    pub reviewed: Option<bool>,
    pub admin_notes: Option<String>,
}

impl FieldSet {
    /// Fill every missing field from `fallback`.
    pub fn or(self, fallback: FieldSet) -> FieldSet {
        FieldSet {
            id: self.id.or(fallback.id),
            reporter: self.reporter.or(fallback.reporter),
            reported: self.reported.or(fallback.reported),
            event_id: self.event_id.or(fallback.event_id),
            event_name: self.event_name.or(fallback.event_name),
            reason: self.reason.or(fallback.reason),
            description: self.description.or(fallback.description),
            report_date: self.report_date.or(fallback.report_date),
            status: self.status.or(fallback.status),
            reviewed: self.reviewed.or(fallback.reviewed),
            admin_notes: self.admin_notes.or(fallback.admin_notes),
        }
    }
}

/// A wire record after schema classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReportRecord {
    /// Carries `reporter_id` or `reported_id`. Legacy fields are kept as a
    /// fallback for anything the current layout leaves out.
    Current { fields: FieldSet, legacy: FieldSet },
    /// Carries `reporterId` or `reportedId` and no current identity fields.
    Legacy(FieldSet),
    /// Neither identity pair is present; every recognized alias merged.
    Unrecognized(FieldSet),
}

impl RawReportRecord {
    /// Classify an untyped JSON record. Never fails: non-objects become an
    /// empty `Unrecognized` record.
    pub fn classify(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return RawReportRecord::Unrecognized(FieldSet::default());
        };

        let current = current_fields(map);
        let legacy = legacy_fields(map);

        if current.reporter.id.is_some() || current.reported.id.is_some() {
            RawReportRecord::Current {
                fields: current,
                legacy,
            }
        } else if legacy.reporter.id.is_some() || legacy.reported.id.is_some() {
            RawReportRecord::Legacy(legacy)
        } else {
            RawReportRecord::Unrecognized(current.or(legacy).or(alias_fields(map)))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RawReportRecord::Current { .. } => "current",
            RawReportRecord::Legacy(_) => "legacy",
            RawReportRecord::Unrecognized(_) => "unrecognized",
        }
    }
}

fn current_fields(map: &Map<String, Value>) -> FieldSet {
    FieldSet {
        id: first_text(map, &["id", "_id"]),
        reporter: SubjectFields {
            id: text(map, "reporter_id"),
            username: text(map, "reporter_username"),
            legacy_name: None,
            display_name: text(map, "reporter_name"),
            email: text(map, "reporter_email"),
        },
        reported: SubjectFields {
            id: text(map, "reported_id"),
            username: text(map, "reported_username"),
            legacy_name: None,
            display_name: text(map, "reported_name"),
            email: text(map, "reported_email"),
        },
        event_id: text(map, "event_id"),
        event_name: text(map, "event_name"),
        reason: text(map, "report_reason"),
        description: text(map, "description"),
        report_date: text(map, "report_date"),
        status: text(map, "status"),
        reviewed: None,
        admin_notes: text(map, "admin_notes"),
    }
}

fn legacy_fields(map: &Map<String, Value>) -> FieldSet {
    FieldSet {
        id: first_text(map, &["id", "_id"]),
        reporter: SubjectFields {
            id: text(map, "reporterId"),
            username: text(map, "reporterUsername"),
            legacy_name: text(map, "reporterName"),
            display_name: None,
            email: text(map, "reporterEmail"),
        },
        reported: SubjectFields {
            id: text(map, "reportedId"),
            username: text(map, "reportedUsername"),
            legacy_name: text(map, "reportedName"),
            display_name: None,
            email: text(map, "reportedEmail"),
        },
        event_id: text(map, "eventId"),
        event_name: text(map, "eventName"),
        reason: text(map, "reason"),
        description: text(map, "description"),
        report_date: text(map, "reportDate"),
        status: text(map, "status"),
        reviewed: flag(map, "reviewed"),
        admin_notes: text(map, "adminMessage"),
    }
}

/// Aliases seen only on records that match neither layout.
fn alias_fields(map: &Map<String, Value>) -> FieldSet {
    FieldSet {
        id: text(map, "report_id"),
        reporter: nested_subject(map.get("reporter")),
        reported: nested_subject(map.get("reported")),
        event_id: None,
        event_name: None,
        reason: None,
        description: text(map, "details"),
        report_date: first_text(map, &["created_at", "createdAt"]),
        status: None,
        reviewed: None,
        admin_notes: None,
    }
}

/// `reporter: {...}` / `reported: {...}` objects, or a bare id string.
fn nested_subject(value: Option<&Value>) -> SubjectFields {
    match value {
        Some(Value::Object(obj)) => SubjectFields {
            id: first_text(obj, &["id", "_id"]),
            username: text(obj, "username"),
            legacy_name: None,
            display_name: text(obj, "name"),
            email: text(obj, "email"),
        },
        Some(other) => SubjectFields {
            id: value_text(other),
            ..SubjectFields::default()
        },
        None => SubjectFields::default(),
    }
}

/// Read a field as trimmed, non-empty text. Numbers are stringified so
/// numeric ids compare equal to their string form.
fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(value_text)
}

fn first_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(map, key))
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
