use crate::ranking::{RankedDivision, rank_divisions};
use crate::record::{Dimension, SavingsKind, SolutionRecord};
use serde::Serialize;
use std::collections::HashMap;

/// Grouped savings for one category of a dimension
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSummary {
    pub category: String,
    pub smv_unlock: f64,
    pub oh_reduction: f64,
    pub other_savings: f64,
    pub solution_count: usize,
}

impl DimensionSummary {
    pub fn new(category: impl Into<String>) -> Self {
        DimensionSummary {
            category: category.into(),
            smv_unlock: 0.0,
            oh_reduction: 0.0,
            other_savings: 0.0,
            solution_count: 0,
        }
    }

    pub fn savings(&self, kind: SavingsKind) -> f64 {
        match kind {
            SavingsKind::SmvUnlock => self.smv_unlock,
            SavingsKind::OhReduction => self.oh_reduction,
            SavingsKind::OtherSavings => self.other_savings,
        }
    }

    /// Sum of the three savings measures
    pub fn total_savings(&self) -> f64 {
        self.smv_unlock + self.oh_reduction + self.other_savings
    }

    pub(crate) fn add(&mut self, record: &SolutionRecord) {
        self.smv_unlock += record.savings(SavingsKind::SmvUnlock);
        self.oh_reduction += record.savings(SavingsKind::OhReduction);
        self.other_savings += record.savings(SavingsKind::OtherSavings);
        self.solution_count += 1;
    }
}

/// Group records by one dimension
///
/// Produces one row per distinct category in the order the categories first
/// appear. Records without a category are left out; missing savings values
/// add zero.
///
/// # Arguments
/// * `records` - Solution records in input order
/// * `dimension` - Column to group by
///
/// # Returns
/// * `Vec<DimensionSummary>` - One summary per category, first-seen order
pub fn aggregate(records: &[SolutionRecord], dimension: Dimension) -> Vec<DimensionSummary> {
    let mut rows: Vec<DimensionSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let Some(category) = record.category(dimension) else {
            continue;
        };
        let slot = *index.entry(category).or_insert_with(|| {
            rows.push(DimensionSummary::new(category));
            rows.len() - 1
        });
        rows[slot].add(record);
    }

    rows
}

/// Workbook-wide totals shown on the KPI cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub solutions: usize,
    pub smv_unlock: f64,
    pub oh_reduction: f64,
    pub other_savings: f64,
}

impl Totals {
    pub fn compute(records: &[SolutionRecord]) -> Self {
        let sum = |kind| records.iter().map(|r| r.savings(kind)).sum::<f64>();
        Totals {
            solutions: records.len(),
            smv_unlock: sum(SavingsKind::SmvUnlock),
            oh_reduction: sum(SavingsKind::OhReduction),
            other_savings: sum(SavingsKind::OtherSavings),
        }
    }

    pub fn savings(&self, kind: SavingsKind) -> f64 {
        match kind {
            SavingsKind::SmvUnlock => self.smv_unlock,
            SavingsKind::OhReduction => self.oh_reduction,
            SavingsKind::OtherSavings => self.other_savings,
        }
    }

    pub fn grand_total(&self) -> f64 {
        self.smv_unlock + self.oh_reduction + self.other_savings
    }

    /// Average savings per solution, zero for an empty list
    pub fn average_per_solution(&self) -> f64 {
        if self.solutions == 0 {
            0.0
        } else {
            self.grand_total() / self.solutions as f64
        }
    }
}

/// Every aggregate the dashboard needs, computed once from the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub divisions: Vec<DimensionSummary>,
    pub stages: Vec<DimensionSummary>,
    pub focus_areas: Vec<DimensionSummary>,
    pub totals: Totals,
}

impl Aggregates {
    pub fn compute(records: &[SolutionRecord]) -> Self {
        Aggregates {
            divisions: aggregate(records, Dimension::Division),
            stages: aggregate(records, Dimension::Stage),
            focus_areas: aggregate(records, Dimension::FocusArea),
            totals: Totals::compute(records),
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> &[DimensionSummary] {
        match dimension {
            Dimension::Division => &self.divisions,
            Dimension::Stage => &self.stages,
            Dimension::FocusArea => &self.focus_areas,
        }
    }

    pub fn ranking(&self) -> Vec<RankedDivision> {
        rank_divisions(&self.divisions)
    }

    pub fn insights(&self) -> Insights {
        Insights::from_aggregates(self)
    }
}

/// Headline facts for the insights panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub top_division: Option<String>,
    pub best_smv_unlock: Option<String>,
    pub best_oh_reduction: Option<String>,
    pub best_other_savings: Option<String>,
    pub most_solutions: Option<String>,
    pub divisions_tracked: usize,
    pub total_solutions: usize,
    /// Sum of the division totals; records without a division are not included
    pub division_savings: f64,
}

impl Insights {
    pub fn from_aggregates(aggregates: &Aggregates) -> Self {
        let divisions = &aggregates.divisions;
        let best_by = |metric: &dyn Fn(&DimensionSummary) -> f64| {
            first_max(divisions, metric).map(|d| d.category.clone())
        };

        Insights {
            top_division: aggregates
                .ranking()
                .first()
                .map(|ranked| ranked.summary.category.clone()),
            best_smv_unlock: best_by(&|d| d.smv_unlock),
            best_oh_reduction: best_by(&|d| d.oh_reduction),
            best_other_savings: best_by(&|d| d.other_savings),
            most_solutions: best_by(&|d| d.solution_count as f64),
            divisions_tracked: divisions.len(),
            total_solutions: aggregates.totals.solutions,
            division_savings: divisions.iter().map(DimensionSummary::total_savings).sum(),
        }
    }
}

// Earliest row holding the maximum, matching MATCH(MAX(..),..,0)
fn first_max<'a>(
    rows: &'a [DimensionSummary],
    metric: &dyn Fn(&DimensionSummary) -> f64,
) -> Option<&'a DimensionSummary> {
    let mut best: Option<&DimensionSummary> = None;
    for row in rows {
        match best {
            Some(current) if metric(row) <= metric(current) => {}
            _ => best = Some(row),
        }
    }
    best
}
