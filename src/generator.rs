//! One-shot report generation: load, aggregate, render, save.

use crate::dashboard::DashboardRenderer;
use crate::error::ReportError;
use crate::loader::load_records;
use crate::strategy::CellStrategy;
use crate::summary::{Aggregates, Insights, Totals};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "Solution List.xlsx";
pub const BAKED_OUTPUT: &str = "Solution_Dashboard.xlsx";
pub const LIVE_OUTPUT: &str = "Solution_Dashboard_Dynamic.xlsx";

/// Input and output paths from positional arguments `[input] [output]`
///
/// # Arguments
/// * `args` - Command-line arguments without the program name
/// * `default_output` - Output file used when only the input (or nothing) is given
pub fn paths_from_args<I>(args: I, default_output: &str) -> (PathBuf, PathBuf)
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let input = args.next().unwrap_or_else(|| DEFAULT_INPUT.to_string());
    let output = args.next().unwrap_or_else(|| default_output.to_string());
    (PathBuf::from(input), PathBuf::from(output))
}

/// What a generator run produced, printed by the binaries
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub output: PathBuf,
    pub summary_sheet: &'static str,
    pub totals: Totals,
    pub insights: Insights,
    pub stages: usize,
    pub focus_areas: usize,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |value: &Option<String>| value.clone().unwrap_or_else(|| "n/a".to_string());

        writeln!(f, "Dashboard created: {}", self.output.display())?;
        writeln!(f, "Sheets: Dashboard, Data, {}", self.summary_sheet)?;
        writeln!(f)?;
        writeln!(f, "Total solutions:      {}", self.totals.solutions)?;
        writeln!(f, "Total SMV unlock:     {:.3}", self.totals.smv_unlock)?;
        writeln!(f, "Total OH reduction:   {:.1}", self.totals.oh_reduction)?;
        writeln!(f, "Total other savings:  {:.1}", self.totals.other_savings)?;
        writeln!(
            f,
            "Average per solution: {:.2}",
            self.totals.average_per_solution()
        )?;
        writeln!(f)?;
        writeln!(f, "Top division:         {}", name(&self.insights.top_division))?;
        writeln!(f, "Best SMV unlock:      {}", name(&self.insights.best_smv_unlock))?;
        writeln!(f, "Best OH reduction:    {}", name(&self.insights.best_oh_reduction))?;
        writeln!(f, "Best other savings:   {}", name(&self.insights.best_other_savings))?;
        writeln!(f, "Most solutions:       {}", name(&self.insights.most_solutions))?;
        writeln!(f)?;
        writeln!(f, "Divisions:            {}", self.insights.divisions_tracked)?;
        writeln!(f, "Stages:               {}", self.stages)?;
        write!(f, "Focus areas:          {}", self.focus_areas)
    }
}

/// Build a dashboard workbook from `input` and write it to `output`
///
/// Nothing is written when loading fails, and the output file is replaced
/// in one step once the workbook is complete.
pub fn generate<S: CellStrategy>(
    input: &Path,
    output: &Path,
    strategy: S,
) -> Result<GenerationReport, ReportError> {
    log::info!("Loading records from {}", input.display());
    let records = load_records(input)?;

    let aggregates = Aggregates::compute(&records);
    log::info!(
        "Aggregated {} records into {} divisions, {} stages, {} focus areas",
        records.len(),
        aggregates.divisions.len(),
        aggregates.stages.len(),
        aggregates.focus_areas.len()
    );

    let renderer = DashboardRenderer::new(strategy);
    renderer.save(&records, &aggregates, output)?;
    log::info!("Saved dashboard to {}", output.display());

    Ok(GenerationReport {
        output: output.to_path_buf(),
        summary_sheet: renderer.strategy().summary_sheet_name(),
        insights: aggregates.insights(),
        stages: aggregates.stages.len(),
        focus_areas: aggregates.focus_areas.len(),
        totals: aggregates.totals,
    })
}
