//! Filtered views of the solution list for the dashboard page.

use crate::error::ReportError;
use crate::ranking::RankedDivision;
use crate::record::{
    DIVISION, Dimension, FOCUS_AREA, OH_REDUCTION, OTHER_SAVINGS, SMV_UNLOCK, SOLUTION_NAME,
    STAGE, SolutionRecord,
};
use crate::summary::{Aggregates, DimensionSummary, Insights, aggregate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const EXPORT_FILE_NAME: &str = "solution_savings_export.csv";

const EXPORT_HEADER: [&str; 8] = [
    SOLUTION_NAME,
    DIVISION,
    FOCUS_AREA,
    STAGE,
    SMV_UNLOCK,
    OH_REDUCTION,
    OTHER_SAVINGS,
    "Total",
];

/// Narrows the solution list; blank fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolutionFilter {
    pub division: Option<String>,
    pub stage: Option<String>,
    pub focus_area: Option<String>,
    /// Case-insensitive substring of the solution name
    pub search: Option<String>,
}

impl SolutionFilter {
    pub fn is_empty(&self) -> bool {
        [&self.division, &self.stage, &self.focus_area, &self.search]
            .iter()
            .all(|field| active(field).is_none())
    }

    pub fn matches(&self, record: &SolutionRecord) -> bool {
        let exact = |wanted: &Option<String>, dimension: Dimension| match active(wanted) {
            Some(wanted) => record.category(dimension) == Some(wanted),
            None => true,
        };

        let name_matches = match active(&self.search) {
            Some(search) => record
                .solution_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&search.to_lowercase())),
            None => true,
        };

        exact(&self.division, Dimension::Division)
            && exact(&self.stage, Dimension::Stage)
            && exact(&self.focus_area, Dimension::FocusArea)
            && name_matches
    }

    /// Records passing the filter, in input order
    pub fn apply(&self, records: &[SolutionRecord]) -> Vec<SolutionRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Distinct values offered by the filter drop-downs, sorted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub divisions: Vec<String>,
    pub stages: Vec<String>,
    pub focus_areas: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[SolutionRecord]) -> Self {
        let distinct = |dimension: Dimension| -> Vec<String> {
            records
                .iter()
                .filter_map(|r| r.category(dimension))
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        FilterOptions {
            divisions: distinct(Dimension::Division),
            stages: distinct(Dimension::Stage),
            focus_areas: distinct(Dimension::FocusArea),
        }
    }
}

/// Savings cross-tabulated by stage and focus area
///
/// Rows and columns follow first-seen order. `cells[s][f]` holds the records
/// in `stages[s]` with focus area `focus_areas[f]`. Records missing either
/// category only count towards the totals they have a category for, and all
/// records count towards the grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFocusMatrix {
    pub stages: Vec<DimensionSummary>,
    pub focus_areas: Vec<DimensionSummary>,
    pub cells: Vec<Vec<DimensionSummary>>,
    pub grand_total: DimensionSummary,
}

impl StageFocusMatrix {
    pub fn compute(records: &[SolutionRecord]) -> Self {
        let stages = aggregate(records, Dimension::Stage);
        let focus_areas = aggregate(records, Dimension::FocusArea);

        let mut cells: Vec<Vec<DimensionSummary>> = stages
            .iter()
            .map(|_| {
                focus_areas
                    .iter()
                    .map(|focus| DimensionSummary::new(focus.category.clone()))
                    .collect()
            })
            .collect();
        let mut grand_total = DimensionSummary::new("Total");

        for record in records {
            grand_total.add(record);

            let (Some(stage), Some(focus)) = (
                record.category(Dimension::Stage),
                record.category(Dimension::FocusArea),
            ) else {
                continue;
            };
            let s = stages.iter().position(|row| row.category == stage);
            let f = focus_areas.iter().position(|col| col.category == focus);
            if let (Some(s), Some(f)) = (s, f) {
                cells[s][f].add(record);
            }
        }

        StageFocusMatrix {
            stages,
            focus_areas,
            cells,
            grand_total,
        }
    }

    pub fn cell(&self, stage: &str, focus_area: &str) -> Option<&DimensionSummary> {
        let s = self.stages.iter().position(|row| row.category == stage)?;
        let f = self
            .focus_areas
            .iter()
            .position(|col| col.category == focus_area)?;
        Some(&self.cells[s][f])
    }
}

/// Everything the dashboard page shows for one filter selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub filter: SolutionFilter,
    pub options: FilterOptions,
    /// Size of the unfiltered solution list
    pub total_records: usize,
    pub aggregates: Aggregates,
    pub ranking: Vec<RankedDivision>,
    pub insights: Insights,
    pub matrix: StageFocusMatrix,
    pub commercialized: usize,
    pub in_research: usize,
    pub solutions: Vec<SolutionRecord>,
}

impl DashboardView {
    /// Build the view of `records` narrowed by `filter`
    ///
    /// Filter options always list every value in the unfiltered list so a
    /// selection can be widened again.
    ///
    /// # Arguments
    /// * `records` - The whole solution list
    /// * `filter` - Selection made on the page
    ///
    /// # Returns
    /// * `DashboardView` - Aggregates, ranking, insights and matrix of the selection
    pub fn build(records: &[SolutionRecord], filter: &SolutionFilter) -> Self {
        let selected = filter.apply(records);
        let aggregates = Aggregates::compute(&selected);

        DashboardView {
            filter: filter.clone(),
            options: FilterOptions::from_records(records),
            total_records: records.len(),
            ranking: aggregates.ranking(),
            insights: aggregates.insights(),
            matrix: StageFocusMatrix::compute(&selected),
            commercialized: count_in_stage(&selected, "commercialized"),
            in_research: count_in_stage(&selected, "r&d"),
            aggregates,
            solutions: selected,
        }
    }
}

fn count_in_stage(records: &[SolutionRecord], stage: &str) -> usize {
    records
        .iter()
        .filter(|r| {
            r.category(Dimension::Stage)
                .is_some_and(|s| s.eq_ignore_ascii_case(stage))
        })
        .count()
}

/// Write records as CSV with every field quoted and a per-row total
pub fn export_csv(records: &[SolutionRecord]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER)?;
    for record in records {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        writer.write_record([
            text(&record.solution_name),
            text(&record.division),
            text(&record.focus_area),
            text(&record.stage),
            record.smv_unlock.unwrap_or(0.0).to_string(),
            record.oh_reduction.unwrap_or(0.0).to_string(),
            record.other_savings.unwrap_or(0.0).to_string(),
            record.total_savings().to_string(),
        ])?;
    }

    writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))
}
