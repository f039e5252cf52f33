use serde::{Deserialize, Serialize};

use crate::data::aggregate::SummaryKind;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Loader options
// ---------------------------------------------------------------------------

/// Options that shape the loaded schema. Part of the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Any column whose name contains this token is a subject slot.
    pub subject_marker: String,
    /// Subject slots dropped from the schema before use.
    pub excluded_subject_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            subject_marker: "Subject".to_string(),
            excluded_subject_columns: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation options
// ---------------------------------------------------------------------------

/// How placeholder values are removed before summaries are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningMode {
    /// Drop a row from every summary if any of its fields is missing.
    #[default]
    AnyField,
    /// Drop a row only from the summaries that consult the missing field.
    PerSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Placeholder meaning "not recorded".
    pub sentinel: String,
    pub cleaning: CleaningMode,
    /// Summaries to compute, in output order.
    pub summaries: Vec<SummaryKind>,
    pub top_n: usize,
    pub bottom_n: usize,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            sentinel: "Unknown".to_string(),
            cleaning: CleaningMode::default(),
            summaries: SummaryKind::ALL.to_vec(),
            top_n: 20,
            bottom_n: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Everything that differs between dashboard variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub load: LoadOptions,
    pub aggregate: AggregateConfig,
}

impl DashboardConfig {
    /// The variant that hides the mandatory subjects and charts electives only.
    pub fn electives_only() -> Self {
        Self {
            load: LoadOptions {
                excluded_subject_columns: vec![
                    "Subject 1".to_string(),
                    "Subject 2".to_string(),
                    "Subject 3".to_string(),
                ],
                ..LoadOptions::default()
            },
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_json_yields_defaults() {
        let config = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.aggregate.top_n, 20);
        assert_eq!(config.aggregate.bottom_n, 10);
        assert_eq!(config.aggregate.sentinel, "Unknown");
        assert_eq!(config.aggregate.summaries.len(), SummaryKind::ALL.len());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = DashboardConfig::from_json(
            r#"{
                "load": { "excluded_subject_columns": ["Subject 1"] },
                "aggregate": { "cleaning": "per_summary", "summaries": ["branch_counts", "top_subjects"] }
            }"#,
        )
        .unwrap();
        assert_eq!(config.load.subject_marker, "Subject");
        assert_eq!(config.load.excluded_subject_columns, vec!["Subject 1"]);
        assert_eq!(config.aggregate.cleaning, CleaningMode::PerSummary);
        assert_eq!(
            config.aggregate.summaries,
            vec![SummaryKind::BranchCounts, SummaryKind::TopSubjects]
        );
        assert_eq!(config.aggregate.top_n, 20);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = DashboardConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn electives_only_excludes_mandatory_slots() {
        let config = DashboardConfig::electives_only();
        assert_eq!(
            config.load.excluded_subject_columns,
            vec!["Subject 1", "Subject 2", "Subject 3"]
        );
        assert_eq!(config.aggregate, AggregateConfig::default());
    }
}
