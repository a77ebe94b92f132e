//! How computed dashboard cells are written: as fixed numbers or as live formulas.

use rust_xlsxwriter::{Format, Formula, Worksheet, XlsxError};

/// A value the renderer has already computed in Rust
#[derive(Debug, Clone, PartialEq)]
pub enum Computed {
    Number(f64),
    Text(String),
}

impl Computed {
    /// Text stored as the cached result of a formula cell
    ///
    /// The writer stores any result that parses as a number as a numeric
    /// cache, so a text value such as a division named `2024` reads back as a
    /// number from a live formula cell until Excel recalculates it.
    pub fn cached_result(&self) -> String {
        match self {
            Computed::Number(n) => n.to_string(),
            Computed::Text(s) => s.clone(),
        }
    }
}

/// Write a computed value as a plain number or string
pub fn write_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Computed,
    format: &Format,
) -> Result<(), XlsxError> {
    match value {
        Computed::Number(n) => sheet.write_number_with_format(row, col, *n, format)?,
        Computed::Text(s) => sheet.write_string_with_format(row, col, s, format)?,
    };
    Ok(())
}

/// Rendering strategy for every cell whose value is derived from the Data sheet
///
/// The renderer always hands over both the computed value and the formula
/// that reproduces it, so the two strategies stay numerically identical.
pub trait CellStrategy {
    /// Name of the sheet holding the per-dimension summaries
    fn summary_sheet_name(&self) -> &'static str;

    fn subtitle(&self) -> &'static str;

    fn footer_note(&self) -> &'static str;

    fn write_computed(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        col: u16,
        value: &Computed,
        formula: &str,
        format: &Format,
    ) -> Result<(), XlsxError>;
}

/// Bakes computed numbers into the workbook
#[derive(Debug, Clone, Copy, Default)]
pub struct BakedValues;

impl CellStrategy for BakedValues {
    fn summary_sheet_name(&self) -> &'static str {
        "PivotData"
    }

    fn subtitle(&self) -> &'static str {
        "Real-time Analytics  |  Division Performance  |  Savings Breakdown"
    }

    fn footer_note(&self) -> &'static str {
        "Values computed when the dashboard was generated"
    }

    fn write_computed(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        col: u16,
        value: &Computed,
        _formula: &str,
        format: &Format,
    ) -> Result<(), XlsxError> {
        write_value(sheet, row, col, value, format)
    }
}

/// Emits formulas over the Data sheet so edits there flow through the dashboard
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveFormulas;

impl CellStrategy for LiveFormulas {
    fn summary_sheet_name(&self) -> &'static str {
        "Calculations"
    }

    fn subtitle(&self) -> &'static str {
        "Real-time Analytics  |  Division Performance  |  Savings Breakdown  |  Auto-Updates"
    }

    fn footer_note(&self) -> &'static str {
        "Data updates automatically from the 'Data' sheet"
    }

    fn write_computed(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        col: u16,
        value: &Computed,
        formula: &str,
        format: &Format,
    ) -> Result<(), XlsxError> {
        let formula = Formula::new(formula).set_result(value.cached_result());
        sheet.write_formula_with_format(row, col, formula, format)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_results_render_plainly() {
        assert_eq!(Computed::Number(12.0).cached_result(), "12");
        assert_eq!(Computed::Number(0.125).cached_result(), "0.125");
        assert_eq!(Computed::Text("Knit".into()).cached_result(), "Knit");
    }

    #[test]
    fn strategies_name_their_summary_sheets() {
        assert_eq!(BakedValues.summary_sheet_name(), "PivotData");
        assert_eq!(LiveFormulas.summary_sheet_name(), "Calculations");
    }
}
