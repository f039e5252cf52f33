use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::filter::FilteredView;
use super::model::{Attribute, Record};
use crate::config::{AggregateConfig, CleaningMode};

// ---------------------------------------------------------------------------
// Summary tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    BranchCounts,
    CampusCounts,
    MajorCounts,
    TopSubjects,
    /// The tail of the subject ranking, least chosen first. Ties come out in
    /// reverse first-seen order, so the list never overlaps `TopSubjects`
    /// while enough distinct subjects exist.
    BottomSubjects,
    BranchByCampus,
    BranchByMajor,
}

impl SummaryKind {
    pub const ALL: [SummaryKind; 7] = [
        SummaryKind::BranchCounts,
        SummaryKind::CampusCounts,
        SummaryKind::MajorCounts,
        SummaryKind::TopSubjects,
        SummaryKind::BottomSubjects,
        SummaryKind::BranchByCampus,
        SummaryKind::BranchByMajor,
    ];

    /// Human-readable chart title.
    pub fn title(self) -> &'static str {
        match self {
            SummaryKind::BranchCounts => "Students per Branch",
            SummaryKind::CampusCounts => "Students per Campus",
            SummaryKind::MajorCounts => "Students per Major",
            SummaryKind::TopSubjects => "Most Chosen Subjects",
            SummaryKind::BottomSubjects => "Least Chosen Subjects",
            SummaryKind::BranchByCampus => "Branch by Campus",
            SummaryKind::BranchByMajor => "Branch by Major",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// An ordered (category, count) table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountTable {
    pub entries: Vec<CategoryCount>,
}

impl CountTable {
    fn from_pairs<'s>(pairs: impl IntoIterator<Item = (&'s str, usize)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(category, count)| CategoryCount {
                    category: category.to_string(),
                    count,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.count)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|e| (e.category.as_str(), e.count))
    }
}

/// A two-key count pivot. Rows and columns are sorted; absent pairs are 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `counts[r][c]` for `rows[r]` × `columns[c]`.
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: &str, column: &str) -> usize {
        let r = self.rows.iter().position(|k| k == row);
        let c = self.columns.iter().position(|k| k == column);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn row_total(&self, row: &str) -> usize {
        self.rows
            .iter()
            .position(|k| k == row)
            .map_or(0, |r| self.counts[r].iter().sum())
    }

    pub fn column_total(&self, column: &str) -> usize {
        self.columns
            .iter()
            .position(|k| k == column)
            .map_or(0, |c| self.counts.iter().map(|row| row[c]).sum())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryTable {
    Counts(CountTable),
    CrossTab(CrossTab),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub kind: SummaryKind,
    pub title: &'static str,
    pub table: SummaryTable,
}

/// Every requested summary, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub summaries: Vec<Summary>,
}

impl AggregateResult {
    pub fn get(&self, kind: SummaryKind) -> Option<&SummaryTable> {
        self.summaries
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| &s.table)
    }

    pub fn counts(&self, kind: SummaryKind) -> Option<&CountTable> {
        match self.get(kind)? {
            SummaryTable::Counts(table) => Some(table),
            SummaryTable::CrossTab(_) => None,
        }
    }

    pub fn cross_tab(&self, kind: SummaryKind) -> Option<&CrossTab> {
        match self.get(kind)? {
            SummaryTable::CrossTab(table) => Some(table),
            SummaryTable::Counts(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Summaries over `view` with the default configuration.
pub fn aggregate(view: &FilteredView<'_>) -> AggregateResult {
    aggregate_with(view, &AggregateConfig::default())
}

/// Summaries over the cleaned records of `view`.
///
/// Every summary skips records whose consulted fields are missing (sentinel
/// or absent). Under [`CleaningMode::AnyField`] a record missing any field is
/// dropped from all summaries before that.
pub fn aggregate_with(view: &FilteredView<'_>, config: &AggregateConfig) -> AggregateResult {
    let sentinel = config.sentinel.as_str();
    let records: Vec<&Record> = match config.cleaning {
        CleaningMode::AnyField => view
            .records()
            .filter(|r| !r.fields().any(|f| is_missing(f, sentinel)))
            .collect(),
        CleaningMode::PerSummary => view.records().collect(),
    };

    let needs_ranking = config
        .summaries
        .iter()
        .any(|k| matches!(k, SummaryKind::TopSubjects | SummaryKind::BottomSubjects));
    let ranking = if needs_ranking {
        rank_subjects(&records, sentinel)
    } else {
        Vec::new()
    };

    let summaries = config
        .summaries
        .iter()
        .map(|&kind| {
            let table = match kind {
                SummaryKind::BranchCounts => {
                    SummaryTable::Counts(count_by(&records, Attribute::Branch, sentinel))
                }
                SummaryKind::CampusCounts => {
                    SummaryTable::Counts(count_by(&records, Attribute::Campus, sentinel))
                }
                SummaryKind::MajorCounts => {
                    SummaryTable::Counts(count_by(&records, Attribute::Major, sentinel))
                }
                SummaryKind::TopSubjects => SummaryTable::Counts(CountTable::from_pairs(
                    ranking.iter().take(config.top_n).copied(),
                )),
                SummaryKind::BottomSubjects => SummaryTable::Counts(CountTable::from_pairs(
                    ranking.iter().rev().take(config.bottom_n).copied(),
                )),
                SummaryKind::BranchByCampus => SummaryTable::CrossTab(cross_tab(
                    &records,
                    Attribute::Branch,
                    Attribute::Campus,
                    sentinel,
                )),
                SummaryKind::BranchByMajor => SummaryTable::CrossTab(cross_tab(
                    &records,
                    Attribute::Branch,
                    Attribute::Major,
                    sentinel,
                )),
            };
            Summary {
                kind,
                title: kind.title(),
                table,
            }
        })
        .collect();

    AggregateResult { summaries }
}

fn is_missing(value: Option<&str>, sentinel: &str) -> bool {
    value.map_or(true, |v| v == sentinel)
}

fn present<'r>(record: &'r Record, attribute: Attribute, sentinel: &str) -> Option<&'r str> {
    record.get(attribute).filter(|v| *v != sentinel)
}

/// Occurrences per value of `attribute`, sorted by value.
fn count_by(records: &[&Record], attribute: Attribute, sentinel: &str) -> CountTable {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in records.iter().filter_map(|r| present(r, attribute, sentinel)) {
        *counts.entry(value).or_default() += 1;
    }
    CountTable::from_pairs(counts)
}

/// Subject occurrences across all slots, most chosen first. Equal counts keep
/// the order in which the subjects were first seen (row-major over slots).
fn rank_subjects<'r>(records: &[&'r Record], sentinel: &str) -> Vec<(&'r str, usize)> {
    let mut ranking: Vec<(&'r str, usize)> = Vec::new();
    let mut position: HashMap<&'r str, usize> = HashMap::new();

    for subject in records
        .iter()
        .copied()
        .flat_map(|r| r.subjects())
        .filter(|s| !is_missing(*s, sentinel))
        .flatten()
    {
        match position.get(subject) {
            Some(&i) => ranking[i].1 += 1,
            None => {
                position.insert(subject, ranking.len());
                ranking.push((subject, 1));
            }
        }
    }

    ranking.sort_by(|a, b| b.1.cmp(&a.1));
    ranking
}

fn cross_tab(records: &[&Record], row: Attribute, column: Attribute, sentinel: &str) -> CrossTab {
    let pairs: Vec<(&str, &str)> = records
        .iter()
        .filter_map(|r| Some((present(r, row, sentinel)?, present(r, column, sentinel)?)))
        .collect();

    let rows: Vec<&str> = pairs.iter().map(|p| p.0).collect::<BTreeSet<_>>().into_iter().collect();
    let columns: Vec<&str> = pairs.iter().map(|p| p.1).collect::<BTreeSet<_>>().into_iter().collect();

    let mut counts = vec![vec![0usize; columns.len()]; rows.len()];
    for (r, c) in &pairs {
        // Both keys were collected from `pairs`, so the searches always hit.
        if let (Ok(ri), Ok(ci)) = (rows.binary_search(r), columns.binary_search(c)) {
            counts[ri][ci] += 1;
        }
    }

    CrossTab {
        rows: rows.into_iter().map(str::to_string).collect(),
        columns: columns.into_iter().map(str::to_string).collect(),
        counts,
    }
}
