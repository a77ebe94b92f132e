use serde::{Deserialize, Serialize};

pub const DIVISION: &str = "Division";
pub const SOLUTION_NAME: &str = "Solution Name";
pub const FOCUS_AREA: &str = "Focus Area";
pub const STAGE: &str = "Stage";
pub const SMV_UNLOCK: &str = "SMV Unlock";
pub const OH_REDUCTION: &str = "OH Reduction";
pub const OTHER_SAVINGS: &str = "Other Savings";

/// Expected input columns, in the order they are written to the Data sheet.
pub const COLUMNS: [&str; 7] = [
    DIVISION,
    SOLUTION_NAME,
    FOCUS_AREA,
    STAGE,
    SMV_UNLOCK,
    OH_REDUCTION,
    OTHER_SAVINGS,
];

/// One row of the solution list
///
/// Text fields are `None` when the source cell is blank. Numeric fields are
/// `None` when the source cell is blank and count as zero in every sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub division: Option<String>,
    pub solution_name: Option<String>,
    pub focus_area: Option<String>,
    pub stage: Option<String>,
    pub smv_unlock: Option<f64>,
    pub oh_reduction: Option<f64>,
    pub other_savings: Option<f64>,
}

impl SolutionRecord {
    /// Category value of this record along `dimension`, if present
    pub fn category(&self, dimension: Dimension) -> Option<&str> {
        let value = match dimension {
            Dimension::Division => &self.division,
            Dimension::Stage => &self.stage,
            Dimension::FocusArea => &self.focus_area,
        };
        value.as_deref()
    }

    /// Savings value of the given kind, missing values read as zero
    pub fn savings(&self, kind: SavingsKind) -> f64 {
        let value = match kind {
            SavingsKind::SmvUnlock => self.smv_unlock,
            SavingsKind::OhReduction => self.oh_reduction,
            SavingsKind::OtherSavings => self.other_savings,
        };
        value.unwrap_or(0.0)
    }

    pub fn total_savings(&self) -> f64 {
        SavingsKind::ALL.iter().map(|kind| self.savings(*kind)).sum()
    }

    pub fn is_blank(&self) -> bool {
        self == &SolutionRecord::default()
    }
}

/// The three savings measures tracked per solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SavingsKind {
    SmvUnlock,
    OhReduction,
    OtherSavings,
}

impl SavingsKind {
    pub const ALL: [SavingsKind; 3] = [
        SavingsKind::SmvUnlock,
        SavingsKind::OhReduction,
        SavingsKind::OtherSavings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SavingsKind::SmvUnlock => SMV_UNLOCK,
            SavingsKind::OhReduction => OH_REDUCTION,
            SavingsKind::OtherSavings => OTHER_SAVINGS,
        }
    }

    /// Zero-based column of this measure on the Data sheet
    pub fn data_column(self) -> u16 {
        match self {
            SavingsKind::SmvUnlock => 4,
            SavingsKind::OhReduction => 5,
            SavingsKind::OtherSavings => 6,
        }
    }

    /// Series colour used in charts
    pub fn color(self) -> u32 {
        match self {
            SavingsKind::SmvUnlock => 0x118DFF,
            SavingsKind::OhReduction => 0x30B177,
            SavingsKind::OtherSavings => 0xE66C37,
        }
    }
}

/// Categorical columns the solution list is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Division,
    Stage,
    FocusArea,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Division, Dimension::Stage, Dimension::FocusArea];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Division => DIVISION,
            Dimension::Stage => STAGE,
            Dimension::FocusArea => FOCUS_AREA,
        }
    }

    /// Title printed above the dimension's section of the summary sheet
    pub fn section_title(self) -> &'static str {
        match self {
            Dimension::Division => "DIVISION SUMMARY",
            Dimension::Stage => "STAGE SUMMARY",
            Dimension::FocusArea => "FOCUS AREA SUMMARY",
        }
    }

    /// Zero-based column of this dimension on the Data sheet
    pub fn data_column(self) -> u16 {
        match self {
            Dimension::Division => 0,
            Dimension::Stage => 3,
            Dimension::FocusArea => 2,
        }
    }
}
