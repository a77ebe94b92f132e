//! Excel formula text for the live-formula dashboard.
//!
//! Rows and columns passed in are zero-based, as `rust_xlsxwriter` uses them;
//! the generated A1 references are one-based.

use crate::record::{Dimension, SavingsKind};

/// Convert column number to letter (A=1, B=2, etc.)
///
/// Helper function that converts a numerical column index to a spreadsheet-style
/// column letter (A, B, C, ..., Z, AA, AB, etc.).
///
/// # Examples
/// ```
/// use solution_dashboard::formulas::column_to_letter;
///
/// assert_eq!(column_to_letter(1), "A");
/// assert_eq!(column_to_letter(26), "Z");
/// assert_eq!(column_to_letter(27), "AA");
/// assert_eq!(column_to_letter(52), "AZ");
/// ```
pub fn column_to_letter(col: u16) -> String {
    let mut name = String::new();
    let mut n = col;

    while n > 0 {
        n -= 1;
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }

    name
}

/// Relative A1 reference for a zero-based cell, e.g. `(6, 1)` -> `B7`
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", column_to_letter(col + 1), row + 1)
}

/// Absolute single-column range, e.g. `Data!$E$2:$E$100`
pub fn column_range(sheet: &str, col: u16, first_row: u32, last_row: u32) -> String {
    let letter = column_to_letter(col + 1);
    format!(
        "{}!${}${}:${}${}",
        quote_sheet(sheet),
        letter,
        first_row + 1,
        letter,
        last_row + 1
    )
}

fn quote_sheet(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Columns of the summary sheet sections
pub mod summary_col {
    pub const CATEGORY: u16 = 0;
    pub const SMV_UNLOCK: u16 = 1;
    pub const OH_REDUCTION: u16 = 2;
    pub const OTHER_SAVINGS: u16 = 3;
    pub const SOLUTION_COUNT: u16 = 4;
    pub const TOTAL_SAVINGS: u16 = 5;
    pub const RANK: u16 = 6;

    use crate::record::SavingsKind;

    pub fn savings(kind: SavingsKind) -> u16 {
        match kind {
            SavingsKind::SmvUnlock => SMV_UNLOCK,
            SavingsKind::OhReduction => OH_REDUCTION,
            SavingsKind::OtherSavings => OTHER_SAVINGS,
        }
    }
}

/// Zero-based first and last data row of a summary section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub first: u32,
    pub last: u32,
}

/// Builds the formulas that tie the summary and dashboard sheets to the Data sheet
#[derive(Debug, Clone)]
pub struct FormulaBuilder<'a> {
    data_sheet: &'a str,
    summary_sheet: &'a str,
    data_last_row: u32,
}

impl<'a> FormulaBuilder<'a> {
    /// `data_last_row` is the zero-based last row the Data ranges reach
    pub fn new(data_sheet: &'a str, summary_sheet: &'a str, data_last_row: u32) -> Self {
        FormulaBuilder {
            data_sheet,
            summary_sheet,
            data_last_row,
        }
    }

    fn data_range(&self, col: u16) -> String {
        column_range(self.data_sheet, col, 1, self.data_last_row)
    }

    fn summary_range(&self, col: u16, span: RowSpan) -> String {
        column_range(self.summary_sheet, col, span.first, span.last)
    }

    /// Case-sensitive SUM over the records whose dimension equals the category cell
    pub fn group_sum(&self, dimension: Dimension, kind: SavingsKind, category_cell: &str) -> String {
        format!(
            "=SUMPRODUCT(--EXACT({},{}),{})",
            self.data_range(dimension.data_column()),
            category_cell,
            self.data_range(kind.data_column())
        )
    }

    pub fn group_count(&self, dimension: Dimension, category_cell: &str) -> String {
        format!(
            "=SUMPRODUCT(--EXACT({},{}))",
            self.data_range(dimension.data_column()),
            category_cell
        )
    }

    pub fn row_total(&self, row: u32) -> String {
        format!(
            "={}+{}+{}",
            cell_ref(row, summary_col::SMV_UNLOCK),
            cell_ref(row, summary_col::OH_REDUCTION),
            cell_ref(row, summary_col::OTHER_SAVINGS)
        )
    }

    /// Descending rank of the total on `row`; equal totals rank in row order
    pub fn stable_rank(&self, span: RowSpan, row: u32) -> String {
        let letter = column_to_letter(summary_col::TOTAL_SAVINGS + 1);
        let current = cell_ref(row, summary_col::TOTAL_SAVINGS);
        format!(
            "=SUMPRODUCT(--(${l}${first}:${l}${last}>{cur}))+SUMPRODUCT(--(${l}${first}:{cur}={cur}))",
            l = letter,
            first = span.first + 1,
            last = span.last + 1,
            cur = current
        )
    }

    /// Number of Data rows with any of the seven columns filled
    pub fn record_count(&self) -> String {
        let joined: Vec<String> = (0..7u16).map(|col| self.data_range(col)).collect();
        format!("=SUMPRODUCT(--(({})<>\"\"))", joined.join("&"))
    }

    pub fn rounded_total(&self, kind: SavingsKind, decimals: u32) -> String {
        format!(
            "=ROUND(SUM({}),{})",
            self.data_range(kind.data_column()),
            decimals
        )
    }

    /// Average savings per solution, dividing by the record count held in `count_cell`
    pub fn average_per_solution(&self, count_cell: &str) -> String {
        let sums: Vec<String> = SavingsKind::ALL
            .iter()
            .map(|kind| format!("SUM({})", self.data_range(kind.data_column())))
            .collect();
        format!(
            "=IF({c}=0,0,ROUND(({s})/{c},2))",
            c = count_cell,
            s = sums.join("+")
        )
    }

    /// Value from `value_col` of the division holding the rank in `rank_cell`
    pub fn ranked_lookup(
        &self,
        span: RowSpan,
        value_col: u16,
        rank_cell: &str,
        decimals: Option<u32>,
    ) -> String {
        let lookup = format!(
            "INDEX({},MATCH({},{},0))",
            self.summary_range(value_col, span),
            rank_cell,
            self.summary_range(summary_col::RANK, span)
        );
        match decimals {
            Some(dp) => format!("=ROUND({},{})", lookup, dp),
            None => format!("={}", lookup),
        }
    }

    /// Category of the first row holding the largest value of `metric_col`
    pub fn best_by(&self, span: RowSpan, metric_col: u16) -> String {
        let metric = self.summary_range(metric_col, span);
        format!(
            "=INDEX({},MATCH(MAX({m}),{m},0))",
            self.summary_range(summary_col::CATEGORY, span),
            m = metric
        )
    }

    pub fn category_count(&self, span: RowSpan) -> String {
        format!(
            "=COUNTA({})",
            self.summary_range(summary_col::CATEGORY, span)
        )
    }

    pub fn rounded_column_sum(&self, span: RowSpan, col: u16, decimals: u32) -> String {
        format!(
            "=ROUND(SUM({}),{})",
            self.summary_range(col, span),
            decimals
        )
    }
}

/// Round half away from zero, as Excel's ROUND does
///
/// Excel rounds the value it displays to 15 significant digits, so 2.675
/// rounds up to 2.68 even though the nearest double sits just below it.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let significant: f64 = format!("{:.14e}", value).parse().unwrap_or(value);
    let text = significant.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let decimals = decimals as usize;
    if fraction.len() <= decimals {
        return significant;
    }

    let truncated: f64 = if decimals == 0 {
        whole.parse().unwrap_or(significant.abs())
    } else {
        format!("{}.{}", whole, &fraction[..decimals])
            .parse()
            .unwrap_or(significant.abs())
    };
    let magnitude = if fraction.as_bytes()[decimals] >= b'5' {
        let bumped = truncated + 10f64.powi(-(decimals as i32));
        format!("{:.*}", decimals, bumped).parse().unwrap_or(bumped)
    } else {
        truncated
    };

    magnitude.copysign(value)
}
