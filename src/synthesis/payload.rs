//! Sample request bodies derived from an entity's fields

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Number, Value};

use crate::config::entity::{DataType, EntityConfig, EntityField};
use crate::constants::SAMPLE_FIELD_PLACEHOLDER;

/// Pretty-printed sample payload for an entity, using the current time for
/// date fields.
pub fn sample_payload(entity: Option<&EntityConfig>) -> String {
    sample_payload_at(entity, Utc::now())
}

/// Same as [`sample_payload`] with an explicit clock
pub fn sample_payload_at(entity: Option<&EntityConfig>, now: DateTime<Utc>) -> String {
    let fields = entity.map(|e| e.fields.as_slice()).unwrap_or_default();

    let payload = if fields.is_empty() {
        json!({
            "id": 0,
            "sample_field": SAMPLE_FIELD_PLACEHOLDER,
        })
    } else {
        let mut object = Map::new();
        for field in fields {
            object.insert(field.name.clone(), sample_value(field, now));
        }
        Value::Object(object)
    };

    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| String::from("{}"))
}

fn sample_value(field: &EntityField, now: DateTime<Utc>) -> Value {
    match &field.data_type {
        DataType::String => string_sample(&field.name),
        DataType::Integer => json!(0),
        DataType::Float => float_sample(),
        DataType::Boolean => json!(false),
        DataType::Date => date_sample(now),
        DataType::DateTime => datetime_sample(now),
        DataType::Json => json!({}),
        DataType::Other(name) if is_number_family(name) => json!(0),
        DataType::Binary | DataType::Other(_) => guess_from_name(&field.name, now),
    }
}

/// Type names outside the canonical set that still mean "integer"
fn is_number_family(type_name: &str) -> bool {
    matches!(
        type_name.trim().to_lowercase().as_str(),
        "number" | "int" | "integer" | "bigint" | "smallint" | "long"
    )
}

fn guess_from_name(name: &str, now: DateTime<Utc>) -> Value {
    let lowered = name.to_lowercase();
    if lowered.contains("id") || lowered.contains("count") {
        json!(0)
    } else if lowered.contains("date") || lowered.contains("time") {
        date_sample(now)
    } else if lowered.contains("price") || lowered.contains("amount") {
        float_sample()
    } else {
        string_sample(name)
    }
}

fn string_sample(name: &str) -> Value {
    Value::String(format!("sample_{}", name))
}

fn float_sample() -> Value {
    Number::from_f64(0.0).map(Value::Number).unwrap_or(Value::Null)
}

fn date_sample(now: DateTime<Utc>) -> Value {
    Value::String(now.format("%Y-%m-%d").to_string())
}

fn datetime_sample(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
    }

    fn entity(fields: &[(&str, DataType)]) -> EntityConfig {
        let mut entity = EntityConfig::new("users");
        entity.fields = fields
            .iter()
            .map(|(name, data_type)| EntityField::imported(*name, data_type.clone()))
            .collect();
        entity
    }

    #[test]
    fn test_single_integer_field() {
        let users = entity(&[("age", DataType::Integer)]);
        let payload = sample_payload_at(Some(&users), clock());
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value, json!({"age": 0}));
    }

    #[test]
    fn test_types_and_key_order_are_stable() {
        let users = entity(&[
            ("name", DataType::String),
            ("active", DataType::Boolean),
            ("born", DataType::Date),
            ("seen_at", DataType::DateTime),
            ("prefs", DataType::Json),
            ("rating", DataType::Float),
        ]);
        let first = sample_payload_at(Some(&users), clock());
        let second = sample_payload_at(Some(&users), clock());
        assert_eq!(first, second);

        let value: Value = serde_json::from_str(&first).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "active", "born", "seen_at", "prefs", "rating"]);
        assert_eq!(value["name"], "sample_name");
        assert_eq!(value["active"], false);
        assert_eq!(value["born"], "2024-05-01");
        assert_eq!(value["seen_at"], "2024-05-01T10:30:00Z");
        assert_eq!(value["prefs"], json!({}));
        assert!(value["rating"].is_f64());
    }

    #[test]
    fn test_unrecognised_types_use_name_heuristic() {
        let users = entity(&[
            ("user_id", DataType::Other("uuid-ish".into())),
            ("visit_count", DataType::Binary),
            ("due_date", DataType::Other("Timestamp".into())),
            ("price", DataType::Other("Money".into())),
            ("avatar", DataType::Binary),
            ("score", DataType::Other("Number".into())),
        ]);
        let value: Value =
            serde_json::from_str(&sample_payload_at(Some(&users), clock())).unwrap();
        assert_eq!(value["user_id"], 0);
        assert_eq!(value["visit_count"], 0);
        assert_eq!(value["due_date"], "2024-05-01");
        assert!(value["price"].is_f64());
        assert_eq!(value["avatar"], "sample_avatar");
        assert_eq!(value["score"], 0);
    }

    #[test]
    fn test_fallback_payload_when_no_fields() {
        let expected = json!({"id": 0, "sample_field": SAMPLE_FIELD_PLACEHOLDER});
        let empty = EntityConfig::new("users");
        for payload in [
            sample_payload_at(Some(&empty), clock()),
            sample_payload_at(None, clock()),
        ] {
            let value: Value = serde_json::from_str(&payload).unwrap();
            assert_eq!(value, expected);
        }
    }
}
