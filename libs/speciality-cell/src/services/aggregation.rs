use std::collections::HashSet;

use serde_json::{json, Value};

use crate::models::{HospitalLink, Severity, SpecialityCounters};

/// Derive hospital and doctor totals from the link rows of one speciality.
pub fn aggregate_counters(links: &[HospitalLink]) -> SpecialityCounters {
    let hospitals: HashSet<_> = links.iter().map(|link| link.hospital_id).collect();

    SpecialityCounters {
        hospital_count: hospitals.len() as u32,
        doctor_count: links.iter().map(|link| link.doctor_count).sum(),
    }
}

pub fn empty_severity() -> Value {
    json!({ "low": 0, "medium": 0, "high": 0 })
}

/// Shift one severity bucket by `delta`, saturating at zero. Every other key
/// in the object is carried over untouched.
pub fn adjust_severity(severity: &Value, level: Severity, delta: i64) -> Value {
    let mut buckets = severity.as_object().cloned().unwrap_or_else(|| {
        Severity::ALL
            .iter()
            .map(|bucket| (bucket.as_key().to_string(), json!(0)))
            .collect()
    });

    let current = buckets
        .get(level.as_key())
        .and_then(Value::as_i64)
        .unwrap_or(0);

    buckets.insert(level.as_key().to_string(), json!((current + delta).max(0)));
    Value::Object(buckets)
}
