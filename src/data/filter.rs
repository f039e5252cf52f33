use std::collections::{BTreeMap, BTreeSet};
use std::io;

use serde::{Deserialize, Serialize};

use super::model::{Attribute, Dataset, Record};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Filter predicate: which values are accepted per attribute
// ---------------------------------------------------------------------------

/// Accepted values per attribute plus accepted subjects.
///
/// An absent or empty set means "no constraint" for that attribute. The
/// subject set matches a record when any of its slots holds an accepted
/// subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub attributes: BTreeMap<Attribute, BTreeSet<String>>,
    pub subjects: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, attribute: Attribute, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select(attribute, values);
        self
    }

    pub fn with_subjects<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects.extend(values.into_iter().map(Into::into));
        self
    }

    /// Add `values` to the accepted set of `attribute`.
    pub fn select<I, S>(&mut self, attribute: Attribute, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(attribute)
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn toggle(&mut self, attribute: Attribute, value: &str) {
        let selected = self.attributes.entry(attribute).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    pub fn toggle_subject(&mut self, value: &str) {
        if !self.subjects.remove(value) {
            self.subjects.insert(value.to_string());
        }
    }

    /// Drop the constraint on `attribute`.
    pub fn clear(&mut self, attribute: Attribute) {
        self.attributes.remove(&attribute);
    }

    pub fn clear_all(&mut self) {
        self.attributes.clear();
        self.subjects.clear();
    }

    /// The accepted set for `attribute`, if it constrains anything.
    pub fn accepted(&self, attribute: Attribute) -> Option<&BTreeSet<String>> {
        self.attributes.get(&attribute).filter(|s| !s.is_empty())
    }

    pub fn is_unconstrained(&self) -> bool {
        self.subjects.is_empty() && self.attributes.values().all(BTreeSet::is_empty)
    }

    pub fn matches_attribute(&self, attribute: Attribute, record: &Record) -> bool {
        match self.accepted(attribute) {
            None => true,
            Some(accepted) => record.get(attribute).is_some_and(|v| accepted.contains(v)),
        }
    }

    pub fn matches_subjects(&self, record: &Record) -> bool {
        self.subjects.is_empty()
            || record
                .subjects()
                .flatten()
                .any(|s| self.subjects.contains(s))
    }

    /// Whether `record` passes every active predicate.
    pub fn matches(&self, record: &Record) -> bool {
        Attribute::ALL
            .iter()
            .all(|&attr| self.matches_attribute(attr, record))
            && self.matches_subjects(record)
    }
}

/// Return indices of records that pass all active filters, in source order.
pub fn filtered_indices(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<usize> {
    if criteria.is_unconstrained() {
        return (0..dataset.len()).collect();
    }
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| criteria.matches(record))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Column selection
// ---------------------------------------------------------------------------

/// One projected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Attribute(Attribute),
    /// Index into the dataset's subject slots.
    Subject(usize),
}

/// Which columns the view shows, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSelection {
    pub attributes: Vec<Attribute>,
    /// Append every subject slot after the attributes.
    pub show_subjects: bool,
}

impl Default for ColumnSelection {
    /// Every column visible.
    fn default() -> Self {
        Self {
            attributes: Attribute::ALL.to_vec(),
            show_subjects: true,
        }
    }
}

impl ColumnSelection {
    /// No columns at all.
    pub fn none() -> Self {
        Self {
            attributes: Vec::new(),
            show_subjects: false,
        }
    }

    pub fn is_shown(&self, attribute: Attribute) -> bool {
        self.attributes.contains(&attribute)
    }

    /// Show or hide `attribute`. A newly shown attribute takes its schema
    /// position among the ones already shown.
    pub fn toggle(&mut self, attribute: Attribute) {
        if let Some(pos) = self.attributes.iter().position(|&a| a == attribute) {
            self.attributes.remove(pos);
        } else {
            let pos = self
                .attributes
                .iter()
                .position(|&a| a > attribute)
                .unwrap_or(self.attributes.len());
            self.attributes.insert(pos, attribute);
        }
    }

    /// Resolve against a dataset. Repeated attributes keep their first position.
    pub fn resolve(&self, dataset: &Dataset) -> Vec<Column> {
        let mut columns: Vec<Column> = Vec::new();
        for &attr in &self.attributes {
            if !columns.contains(&Column::Attribute(attr)) {
                columns.push(Column::Attribute(attr));
            }
        }
        if self.show_subjects {
            columns.extend((0..dataset.subject_columns.len()).map(Column::Subject));
        }
        columns
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Records that passed the filters, projected onto the selected columns.
///
/// Aggregation reads the full records through [`FilteredView::records`];
/// only display goes through the projection.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
    columns: Vec<Column>,
}

/// An owned, serializable copy of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a Dataset, indices: Vec<usize>, selection: &ColumnSelection) -> Self {
        Self {
            dataset,
            indices,
            columns: selection.resolve(dataset),
        }
    }

    /// Positions of the visible records in the dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn column_names(&self) -> Vec<&'a str> {
        let dataset = self.dataset;
        self.columns
            .iter()
            .map(|c| match *c {
                Column::Attribute(attr) => attr.header(),
                Column::Subject(slot) => dataset.subject_columns[slot].as_str(),
            })
            .collect()
    }

    /// The full filtered records, ignoring the projection.
    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }

    /// Projected rows, one cell per selected column.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Option<&'a str>>> + '_ {
        self.records().map(|record| {
            self.columns
                .iter()
                .map(|c| match *c {
                    Column::Attribute(attr) => record.get(attr),
                    Column::Subject(slot) => record.subject(slot),
                })
                .collect()
        })
    }

    pub fn to_table(&self) -> ViewTable {
        ViewTable {
            columns: self.column_names().into_iter().map(str::to_string).collect(),
            rows: self
                .rows()
                .map(|row| row.into_iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        }
    }

    /// Write the projected view as CSV. Absent cells are left empty.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.column_names())?;
        for row in self.rows() {
            out.write_record(row.iter().map(|c| c.unwrap_or("")))?;
        }
        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// Apply `criteria` to `dataset` and project the survivors onto `columns`.
pub fn filter<'a>(
    dataset: &'a Dataset,
    criteria: &FilterCriteria,
    columns: &ColumnSelection,
) -> FilteredView<'a> {
    FilteredView::new(dataset, filtered_indices(dataset, criteria), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::{dataset, math_physics, record};

    fn roster() -> Dataset {
        dataset(vec![
            record("R1", "CSE", "Main", "AI", &["Maths", "Physics", "Unknown"]),
            record("R2", "ECE", "Main", "VLSI", &["Physics", "Unknown", "Unknown"]),
            record("R3", "CSE", "City", "Cloud", &["Chemistry", "Maths", "Art"]),
            record("R4", "", "City", "AI", &["Art", "", ""]),
            record("R5", "MECH", "Main", "Unknown", &["Unknown", "Unknown", "Unknown"]),
        ])
    }

    fn rolls(view: &FilteredView<'_>) -> Vec<String> {
        view.records()
            .filter_map(|r| r.get(Attribute::RollNo))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn empty_criteria_is_identity() {
        let ds = roster();
        let view = filter(&ds, &FilterCriteria::new(), &ColumnSelection::default());
        assert_eq!(view.indices(), [0, 1, 2, 3, 4]);

        // Present-but-empty sets constrain nothing either.
        let mut criteria = FilterCriteria::new();
        criteria.select(Attribute::Branch, Vec::<String>::new());
        assert!(criteria.is_unconstrained());
        assert_eq!(filtered_indices(&ds, &criteria).len(), ds.len());
    }

    #[test]
    fn attribute_sets_are_membership_tests() {
        let ds = roster();
        let criteria = FilterCriteria::new().with(Attribute::Branch, ["CSE", "MECH"]);
        let view = filter(&ds, &criteria, &ColumnSelection::default());
        assert_eq!(rolls(&view), ["R1", "R3", "R5"]);

        for record in &ds.records {
            let kept = view.records().any(|r| r == record);
            let member = matches!(record.get(Attribute::Branch), Some("CSE" | "MECH"));
            assert_eq!(kept, member);
        }
    }

    #[test]
    fn absent_values_never_match_a_constraint() {
        let ds = roster();
        let criteria = FilterCriteria::new().with(Attribute::Campus, ["City"]);
        assert_eq!(rolls(&filter(&ds, &criteria, &ColumnSelection::default())), ["R3", "R4"]);

        let criteria = criteria.with(Attribute::Branch, ["CSE", "ECE", "MECH"]);
        assert_eq!(rolls(&filter(&ds, &criteria, &ColumnSelection::default())), ["R3"]);
    }

    #[test]
    fn attribute_filters_compose_conjunctively() {
        let ds = roster();
        let criteria = FilterCriteria::new()
            .with(Attribute::Campus, ["Main"])
            .with(Attribute::Major, ["AI", "VLSI"]);
        assert_eq!(rolls(&filter(&ds, &criteria, &ColumnSelection::default())), ["R1", "R2"]);
    }

    #[test]
    fn subject_filter_is_an_or_across_slots() {
        let ds = roster();
        let criteria = FilterCriteria::new().with_subjects(["Physics"]);
        assert_eq!(rolls(&filter(&ds, &criteria, &ColumnSelection::default())), ["R1", "R2"]);

        let criteria = FilterCriteria::new().with_subjects(["Art", "Maths"]);
        assert_eq!(
            rolls(&filter(&ds, &criteria, &ColumnSelection::default())),
            ["R1", "R3", "R4"]
        );
    }

    #[test]
    fn subject_filter_is_anded_with_attributes() {
        let ds = roster();
        let criteria = FilterCriteria::new()
            .with_subjects(["Maths"])
            .with(Attribute::Campus, ["City"]);
        assert_eq!(rolls(&filter(&ds, &criteria, &ColumnSelection::default())), ["R3"]);
    }

    #[test]
    fn filter_order_does_not_matter() {
        let ds = roster();
        let predicates = [
            (Attribute::Campus, vec!["Main", "City"]),
            (Attribute::Major, vec!["AI", "Cloud"]),
            (Attribute::Branch, vec!["CSE"]),
        ];

        let apply = |order: &[usize]| -> Vec<usize> {
            let mut survivors: Vec<usize> = (0..ds.len()).collect();
            for &p in order {
                let (attr, values) = &predicates[p];
                let single = FilterCriteria::new().with(*attr, values.iter().copied());
                survivors.retain(|&i| single.matches(&ds.records[i]));
            }
            survivors
        };

        let all = predicates
            .iter()
            .fold(FilterCriteria::new(), |c, (attr, values)| {
                c.with(*attr, values.iter().copied())
            });
        let expected = filtered_indices(&ds, &all);
        assert_eq!(expected, [0, 2]);
        for order in [[0, 1, 2], [2, 1, 0], [1, 0, 2], [2, 0, 1]] {
            assert_eq!(apply(&order), expected);
        }
    }

    #[test]
    fn example_math_filter_keeps_both_cs_students() {
        let ds = math_physics();
        let criteria = FilterCriteria::new().with_subjects(["Math"]);
        assert_eq!(filtered_indices(&ds, &criteria), [0, 1]);
    }

    #[test]
    fn toggling_adds_then_removes() {
        let mut criteria = FilterCriteria::new();
        criteria.toggle(Attribute::Division, "A");
        assert_eq!(criteria.accepted(Attribute::Division).map(BTreeSet::len), Some(1));
        criteria.toggle(Attribute::Division, "A");
        assert!(criteria.accepted(Attribute::Division).is_none());

        criteria.toggle_subject("Art");
        assert!(!criteria.is_unconstrained());
        criteria.clear_all();
        assert!(criteria.is_unconstrained());
    }

    #[test]
    fn projection_follows_caller_order() {
        let ds = roster();
        let selection = ColumnSelection {
            attributes: vec![Attribute::Major, Attribute::RollNo, Attribute::Major],
            show_subjects: false,
        };
        let view = filter(&ds, &FilterCriteria::new(), &selection);

        assert_eq!(view.column_names(), ["Major", "Roll No"]);
        let first = view.rows().next().unwrap();
        assert_eq!(first, vec![Some("AI"), Some("R1")]);
    }

    #[test]
    fn show_subjects_appends_every_slot() {
        let ds = roster();
        let selection = ColumnSelection {
            attributes: vec![Attribute::Name],
            show_subjects: true,
        };
        let view = filter(&ds, &FilterCriteria::new(), &selection);
        assert_eq!(
            view.column_names(),
            ["Name", "Subject 1", "Subject 2", "Subject 3"]
        );
        let r4 = view.rows().nth(3).unwrap();
        assert_eq!(r4, vec![Some("Student R4"), Some("Art"), None, None]);
    }

    #[test]
    fn empty_selection_projects_zero_columns() {
        let ds = roster();
        let view = filter(&ds, &FilterCriteria::new(), &ColumnSelection::none());
        assert_eq!(view.len(), 5);
        assert!(view.column_names().is_empty());
        assert!(view.rows().all(|row| row.is_empty()));
        // The records themselves stay whole.
        assert_eq!(view.records().count(), 5);
    }

    #[test]
    fn toggling_columns_keeps_schema_positions() {
        let mut selection = ColumnSelection::default();
        selection.toggle(Attribute::SapId);
        selection.toggle(Attribute::Campus);
        assert!(!selection.is_shown(Attribute::SapId));
        selection.toggle(Attribute::SapId);
        assert_eq!(
            selection.attributes,
            vec![
                Attribute::RollNo,
                Attribute::SapId,
                Attribute::Name,
                Attribute::Branch,
                Attribute::Major,
                Attribute::Division,
            ]
        );
    }

    #[test]
    fn writes_projected_csv() {
        let ds = roster();
        let criteria = FilterCriteria::new().with(Attribute::RollNo, ["R4"]);
        let selection = ColumnSelection {
            attributes: vec![Attribute::RollNo, Attribute::Branch],
            show_subjects: true,
        };
        let mut out = Vec::new();
        filter(&ds, &criteria, &selection).write_csv(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Roll No,Branch,Subject 1,Subject 2,Subject 3\nR4,,Art,,\n"
        );
    }

    #[test]
    fn owned_table_mirrors_the_view() {
        let ds = math_physics();
        let criteria = FilterCriteria::new().with(Attribute::Branch, ["EE"]);
        let selection = ColumnSelection {
            attributes: vec![Attribute::SapId],
            show_subjects: false,
        };
        let table = filter(&ds, &criteria, &selection).to_table();
        assert_eq!(table.columns, vec!["SAP ID"]);
        assert_eq!(table.rows, vec![vec![Some("5003".to_string())]]);
    }
}
