//! Record builders shared by the unit tests.

use super::model::{Dataset, Record};

/// A record with the given categorical fields; `""` means absent.
pub(crate) fn record(
    roll: &str,
    branch: &str,
    campus: &str,
    major: &str,
    subjects: &[&str],
) -> Record {
    let field = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Record::new(
        [
            field(roll),
            Some(roll.replace('R', "500")),
            Some(format!("Student {roll}")),
            field(branch),
            field(campus),
            field(major),
            Some("A".to_string()),
        ],
        subjects.iter().map(|s| field(*s)).collect(),
    )
}

/// Wrap records in a dataset whose slots are named "Subject 1".."Subject N".
pub(crate) fn dataset(records: Vec<Record>) -> Dataset {
    let slots = records.first().map_or(2, |r| r.subjects().count());
    let subject_columns = (1..=slots).map(|i| format!("Subject {i}")).collect();
    Dataset::from_records(records, subject_columns)
}

/// The three-record example: two CS students sharing Math, one EE student
/// with no recorded subjects.
pub(crate) fn math_physics() -> Dataset {
    dataset(vec![
        record("R1", "CS", "Main", "AI", &["Math", "Unknown"]),
        record("R2", "CS", "Main", "AI", &["Math", "Physics"]),
        record("R3", "EE", "City", "VLSI", &["Unknown", "Unknown"]),
    ])
}
