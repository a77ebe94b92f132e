//! Dashboard workbook rendering.
//!
//! A rendered workbook has three sheets in this order:
//! - `Dashboard`: title band, KPI cards, four charts, the top performers
//!   table and the key insights panel, laid out on a 21-column grid
//! - `Data`: the cleaned records under the seven canonical headers
//! - the summary sheet (`PivotData` or `Calculations`, named by the
//!   [`CellStrategy`]) holding the division, stage and focus area sections
//!   the charts and tables read from
//!
//! Every derived cell goes through the strategy, which either bakes the
//! computed value or writes a formula carrying that value as its cached result.

use crate::error::ReportError;
use crate::formulas::{FormulaBuilder, RowSpan, cell_ref, round_to, summary_col};
use crate::ranking::ranks_in_input_order;
use crate::record::{COLUMNS, Dimension, SavingsKind, SolutionRecord};
use crate::saving::write_atomically;
use crate::strategy::{CellStrategy, Computed, write_value};
use crate::styles::{self, Styles};
use crate::summary::Aggregates;
use rust_xlsxwriter::{
    Chart, ChartDataLabel, ChartFormat, ChartLegendPosition, ChartSolidFill, ChartType, Format,
    Workbook, Worksheet,
};
use std::path::Path;

pub const DASHBOARD_SHEET: &str = "Dashboard";
pub const DATA_SHEET: &str = "Data";

// Data ranges in formulas always reach at least this (zero-based) row so a
// few appended records are picked up without regenerating.
const MIN_DATA_LAST_ROW: u32 = 99;

const LAST_GRID_COL: u16 = 20;
const CONTENT_FIRST_COL: u16 = 1;
const CONTENT_LAST_COL: u16 = 18;

const KPI_ACCENT_ROW: u32 = 4;
const KPI_TITLE_ROW: u32 = 5;
const KPI_VALUE_ROW: u32 = 6;
const KPI_PAD_ROW: u32 = 7;
const KPI_FIRST_COLS: [u16; 5] = [1, 5, 9, 13, 17];
const KPI_WIDTH: u16 = 3;

const UPPER_CHART_HEADER_ROW: u32 = 10;
const LOWER_CHART_HEADER_ROW: u32 = 28;
const LEFT_PANEL: (u16, u16) = (1, 8);
const RIGHT_PANEL: (u16, u16) = (11, 18);

const RANK_SECTION_ROW: u32 = 46;
const RANK_HEADER_ROW: u32 = 47;
const RANK_FIRST_ROW: u32 = 48;
const RANK_COLS: [u16; 7] = [1, 2, 4, 5, 6, 7, 8];
const RANK_HEADERS: [&str; 7] = [
    "Rank",
    "Division",
    "SMV Unlock",
    "OH Reduction",
    "Other Savings",
    "Total",
    "Solutions",
];

const INSIGHT_FIRST_ROW: u32 = 47;
const INSIGHT_LABEL_COLS: (u16, u16) = (11, 13);
const INSIGHT_VALUE_COLS: (u16, u16) = (14, 17);
const INSIGHT_PAD_COL: u16 = 18;

const FOOTER_MIN_ROW: u32 = 55;

const DATA_COLUMN_WIDTHS: [f64; 7] = [15.0, 18.0, 25.0, 15.0, 12.0, 14.0, 14.0];
const SUMMARY_COLUMN_WIDTHS: [f64; 7] = [24.0, 14.0, 14.0, 14.0, 15.0, 14.0, 8.0];

/// Row positions of one section of the summary sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummarySection {
    pub title_row: u32,
    pub header_row: u32,
    pub first_row: u32,
    pub len: u32,
}

impl SummarySection {
    /// Data rows of the section, `None` when the dimension has no categories
    pub fn span(&self) -> Option<RowSpan> {
        (self.len > 0).then(|| RowSpan {
            first: self.first_row,
            last: self.first_row + self.len - 1,
        })
    }
}

/// Where each dimension's section sits on the summary sheet
///
/// Sections are stacked as title row, header row, data rows, then two
/// blank rows before the next title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLayout {
    pub division: SummarySection,
    pub stage: SummarySection,
    pub focus_area: SummarySection,
}

impl SummaryLayout {
    pub fn new(aggregates: &Aggregates) -> Self {
        let mut next = 0;
        let mut place = |len: usize| {
            let section = SummarySection {
                title_row: next,
                header_row: next + 1,
                first_row: next + 2,
                len: len as u32,
            };
            next = section.first_row + section.len + 2;
            section
        };

        SummaryLayout {
            division: place(aggregates.divisions.len()),
            stage: place(aggregates.stages.len()),
            focus_area: place(aggregates.focus_areas.len()),
        }
    }

    pub fn section(&self, dimension: Dimension) -> SummarySection {
        match dimension {
            Dimension::Division => self.division,
            Dimension::Stage => self.stage,
            Dimension::FocusArea => self.focus_area,
        }
    }
}

/// Zero-based row of the dashboard footer
///
/// Sits below both the ranking table and the insights panel, never above the
/// fixed footer position used for short division lists.
pub fn footer_row(division_count: usize) -> u32 {
    let table_end = RANK_FIRST_ROW + division_count as u32;
    let insights_end = INSIGHT_FIRST_ROW + INSIGHT_LABELS.len() as u32;
    FOOTER_MIN_ROW.max(table_end.max(insights_end) + 1)
}

const INSIGHT_LABELS: [&str; 7] = [
    "TOP DIVISION",
    "BEST SMV UNLOCK",
    "BEST OH REDUCTION",
    "BEST OTHER SAVINGS",
    "MOST SOLUTIONS",
    "TOTAL DIVISIONS",
    "TOTAL SAVINGS",
];

struct KpiCard {
    title: &'static str,
    value: f64,
    formula: String,
    color: u32,
    num_format: &'static str,
}

struct InsightItem {
    label: &'static str,
    value: Computed,
    formula: Option<String>,
    color: u32,
    num_format: &'static str,
}

/// Renders records and their aggregates into a dashboard workbook
pub struct DashboardRenderer<S> {
    strategy: S,
    generated_at: String,
}

impl<S: CellStrategy> DashboardRenderer<S> {
    pub fn new(strategy: S) -> Self {
        DashboardRenderer {
            strategy,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        }
    }

    /// Override the footer timestamp, mainly so output can be compared across runs
    pub fn with_timestamp(mut self, generated_at: impl Into<String>) -> Self {
        self.generated_at = generated_at.into();
        self
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Build the workbook in memory
    ///
    /// # Arguments
    /// * `records` - Cleaned records, written to the Data sheet in order
    /// * `aggregates` - Aggregates computed from the same records
    ///
    /// # Returns
    /// * `Result<Workbook, ReportError>` - The workbook, ready to be saved
    pub fn render(
        &self,
        records: &[SolutionRecord],
        aggregates: &Aggregates,
    ) -> Result<Workbook, ReportError> {
        let summary_sheet = self.strategy.summary_sheet_name();
        let layout = SummaryLayout::new(aggregates);
        let data_last_row = (records.len() as u32).max(MIN_DATA_LAST_ROW);
        let formulas = FormulaBuilder::new(DATA_SHEET, summary_sheet, data_last_row);
        let styles = Styles::new();

        let mut dashboard = Worksheet::new();
        dashboard.set_name(DASHBOARD_SHEET)?;
        let mut data = Worksheet::new();
        data.set_name(DATA_SHEET)?;
        let mut summary = Worksheet::new();
        summary.set_name(summary_sheet)?;

        write_data_sheet(&mut data, records, &styles)?;
        self.write_summary_sheet(&mut summary, aggregates, &layout, &formulas, &styles)?;
        self.write_dashboard(&mut dashboard, aggregates, &layout, &formulas, &styles)?;

        let mut workbook = Workbook::new();
        workbook.push_worksheet(dashboard);
        workbook.push_worksheet(data);
        workbook.push_worksheet(summary);

        log::debug!(
            "Rendered dashboard with {} records, {} divisions",
            records.len(),
            aggregates.divisions.len()
        );
        Ok(workbook)
    }

    pub fn render_to_buffer(
        &self,
        records: &[SolutionRecord],
        aggregates: &Aggregates,
    ) -> Result<Vec<u8>, ReportError> {
        let mut workbook = self.render(records, aggregates)?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Render and write the workbook to `path`
    ///
    /// The file is only replaced once rendering has fully succeeded.
    pub fn save(
        &self,
        records: &[SolutionRecord],
        aggregates: &Aggregates,
        path: impl AsRef<Path>,
    ) -> Result<(), ReportError> {
        let buffer = self.render_to_buffer(records, aggregates)?;
        write_atomically(path.as_ref(), &buffer)?;
        Ok(())
    }

    fn write_summary_sheet(
        &self,
        sheet: &mut Worksheet,
        aggregates: &Aggregates,
        layout: &SummaryLayout,
        formulas: &FormulaBuilder,
        styles: &Styles,
    ) -> Result<(), ReportError> {
        for (col, width) in SUMMARY_COLUMN_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }

        for dimension in Dimension::ALL {
            let section = layout.section(dimension);
            let rows = aggregates.dimension(dimension);
            let is_division = dimension == Dimension::Division;

            sheet.write_string_with_format(
                section.title_row,
                0,
                dimension.section_title(),
                &styles.section_title,
            )?;

            let mut headers = vec![dimension.label()];
            headers.extend(SavingsKind::ALL.iter().map(|kind| kind.label()));
            headers.push("Solution Count");
            if is_division {
                headers.extend(["Total Savings", "Rank"]);
            }
            for (col, header) in headers.iter().enumerate() {
                sheet.write_string_with_format(
                    section.header_row,
                    col as u16,
                    *header,
                    &styles.data_header,
                )?;
            }

            let ranks = if is_division {
                ranks_in_input_order(rows)
            } else {
                Vec::new()
            };

            for (i, summary) in rows.iter().enumerate() {
                let row = section.first_row + i as u32;
                let category_cell = format!("$A{}", row + 1);

                sheet.write_string_with_format(
                    row,
                    summary_col::CATEGORY,
                    &summary.category,
                    &styles.data_text,
                )?;

                for kind in SavingsKind::ALL {
                    self.strategy.write_computed(
                        sheet,
                        row,
                        summary_col::savings(kind),
                        &Computed::Number(summary.savings(kind)),
                        &formulas.group_sum(dimension, kind, &category_cell),
                        &styles.data_number,
                    )?;
                }

                self.strategy.write_computed(
                    sheet,
                    row,
                    summary_col::SOLUTION_COUNT,
                    &Computed::Number(summary.solution_count as f64),
                    &formulas.group_count(dimension, &category_cell),
                    &styles.data_number,
                )?;

                if let (true, Some(span)) = (is_division, section.span()) {
                    self.strategy.write_computed(
                        sheet,
                        row,
                        summary_col::TOTAL_SAVINGS,
                        &Computed::Number(summary.total_savings()),
                        &formulas.row_total(row),
                        &styles.data_number,
                    )?;
                    self.strategy.write_computed(
                        sheet,
                        row,
                        summary_col::RANK,
                        &Computed::Number(ranks[i] as f64),
                        &formulas.stable_rank(span, row),
                        &styles.data_number,
                    )?;
                }
            }
        }

        Ok(())
    }

    fn write_dashboard(
        &self,
        sheet: &mut Worksheet,
        aggregates: &Aggregates,
        layout: &SummaryLayout,
        formulas: &FormulaBuilder,
        styles: &Styles,
    ) -> Result<(), ReportError> {
        let footer = footer_row(aggregates.divisions.len());

        // Page background first so later cells overwrite it
        for row in 0..=footer + 2 {
            for col in 0..=LAST_GRID_COL {
                sheet.write_blank(row, col, &styles.background)?;
            }
        }
        for col in 0..=LAST_GRID_COL {
            sheet.set_column_width(col, 11)?;
        }
        sheet.set_column_width(0, 2)?;
        sheet.set_column_width(3, 2)?;

        sheet.merge_range(
            1,
            CONTENT_FIRST_COL,
            1,
            CONTENT_LAST_COL,
            "SOLUTION SAVINGS DASHBOARD",
            &styles.title,
        )?;
        sheet.set_row_height(1, 55)?;
        sheet.merge_range(
            2,
            CONTENT_FIRST_COL,
            2,
            CONTENT_LAST_COL,
            self.strategy.subtitle(),
            &styles.subtitle,
        )?;
        sheet.set_row_height(2, 25)?;

        self.write_kpi_cards(sheet, aggregates, formulas, styles)?;
        self.write_charts(sheet, layout, styles)?;
        self.write_ranking_table(sheet, aggregates, layout, formulas, styles)?;
        self.write_insights(sheet, aggregates, layout, formulas, styles)?;

        sheet.merge_range(
            footer,
            CONTENT_FIRST_COL,
            footer,
            CONTENT_LAST_COL,
            &format!(
                "{}  |  Generated {}",
                self.strategy.footer_note(),
                self.generated_at
            ),
            &styles.footer,
        )?;

        sheet.set_screen_gridlines(false);
        sheet.set_landscape();
        sheet.set_print_area(0, 0, footer + 1, CONTENT_LAST_COL + 1)?;

        Ok(())
    }

    fn write_kpi_cards(
        &self,
        sheet: &mut Worksheet,
        aggregates: &Aggregates,
        formulas: &FormulaBuilder,
        styles: &Styles,
    ) -> Result<(), ReportError> {
        let totals = &aggregates.totals;
        let count_cell = cell_ref(KPI_VALUE_ROW, KPI_FIRST_COLS[0]);

        let cards = [
            KpiCard {
                title: "TOTAL SOLUTIONS",
                value: totals.solutions as f64,
                formula: formulas.record_count(),
                color: styles::PRIMARY,
                num_format: "#,##0",
            },
            KpiCard {
                title: "TOTAL SMV UNLOCK",
                value: round_to(totals.smv_unlock, 3),
                formula: formulas.rounded_total(SavingsKind::SmvUnlock, 3),
                color: styles::SUCCESS,
                num_format: "#,##0.000",
            },
            KpiCard {
                title: "OH REDUCTION",
                value: round_to(totals.oh_reduction, 1),
                formula: formulas.rounded_total(SavingsKind::OhReduction, 1),
                color: styles::ACCENT_ORANGE,
                num_format: "#,##0.0",
            },
            KpiCard {
                title: "OTHER SAVINGS",
                value: round_to(totals.other_savings, 1),
                formula: formulas.rounded_total(SavingsKind::OtherSavings, 1),
                color: styles::ACCENT_PURPLE,
                num_format: "#,##0.0",
            },
            KpiCard {
                title: "AVG / SOLUTION",
                value: round_to(totals.average_per_solution(), 2),
                formula: formulas.average_per_solution(&count_cell),
                color: styles::WARNING,
                num_format: "#,##0.00",
            },
        ];

        sheet.set_row_height(KPI_ACCENT_ROW, 6)?;
        sheet.set_row_height(KPI_TITLE_ROW, 22)?;
        sheet.set_row_height(KPI_VALUE_ROW, 45)?;
        sheet.set_row_height(KPI_PAD_ROW, 8)?;

        for (card, first_col) in cards.iter().zip(KPI_FIRST_COLS) {
            let last_col = first_col + KPI_WIDTH - 1;
            let accent = styles.kpi_accent(card.color);
            let value_format = styles.kpi_value(card.color, card.num_format);

            for col in first_col..=last_col {
                sheet.write_blank(KPI_ACCENT_ROW, col, &accent)?;
                sheet.write_blank(KPI_PAD_ROW, col, &styles.kpi_pad)?;
            }
            sheet.merge_range(
                KPI_TITLE_ROW,
                first_col,
                KPI_TITLE_ROW,
                last_col,
                card.title,
                &styles.kpi_title,
            )?;
            sheet.merge_range(
                KPI_VALUE_ROW,
                first_col,
                KPI_VALUE_ROW,
                last_col,
                "",
                &value_format,
            )?;
            self.strategy.write_computed(
                sheet,
                KPI_VALUE_ROW,
                first_col,
                &Computed::Number(card.value),
                &card.formula,
                &value_format,
            )?;
        }

        Ok(())
    }

    fn write_charts(
        &self,
        sheet: &mut Worksheet,
        layout: &SummaryLayout,
        styles: &Styles,
    ) -> Result<(), ReportError> {
        let summary = self.strategy.summary_sheet_name();

        let headers = [
            (UPPER_CHART_HEADER_ROW, LEFT_PANEL, "DIVISION PERFORMANCE"),
            (UPPER_CHART_HEADER_ROW, RIGHT_PANEL, "STAGE DISTRIBUTION"),
            (LOWER_CHART_HEADER_ROW, LEFT_PANEL, "FOCUS AREA BREAKDOWN"),
            (LOWER_CHART_HEADER_ROW, RIGHT_PANEL, "TOTAL SAVINGS BY DIVISION"),
        ];
        for (row, (first_col, last_col), title) in headers {
            sheet.merge_range(row, first_col, row, last_col, title, &styles.section_header)?;
            sheet.set_row_height(row, 35)?;
        }

        let division = layout.division;
        if let Some(span) = division.span() {
            let mut chart = Chart::new(ChartType::Column);
            add_savings_series(&mut chart, summary, division.header_row, span);
            finish_chart(&mut chart, 680, 400);
            sheet.insert_chart(UPPER_CHART_HEADER_ROW + 1, LEFT_PANEL.0, &chart)?;

            let mut pie = Chart::new(ChartType::Pie);
            pie.add_series()
                .set_name((summary, division.header_row, summary_col::TOTAL_SAVINGS))
                .set_categories(category_range(summary, span))
                .set_values(value_range(summary, span, summary_col::TOTAL_SAVINGS))
                .set_data_label(ChartDataLabel::new().show_percentage().show_category_name());
            finish_chart(&mut pie, 680, 400);
            sheet.insert_chart(LOWER_CHART_HEADER_ROW + 1, RIGHT_PANEL.0, &pie)?;
        }

        let stage = layout.stage;
        if let Some(span) = stage.span() {
            let mut doughnut = Chart::new(ChartType::Doughnut);
            doughnut
                .add_series()
                .set_name((summary, stage.header_row, summary_col::SOLUTION_COUNT))
                .set_categories(category_range(summary, span))
                .set_values(value_range(summary, span, summary_col::SOLUTION_COUNT))
                .set_data_label(ChartDataLabel::new().show_percentage().show_category_name());
            doughnut.set_hole_size(50);
            finish_chart(&mut doughnut, 680, 400);
            sheet.insert_chart(UPPER_CHART_HEADER_ROW + 1, RIGHT_PANEL.0, &doughnut)?;
        }

        let focus = layout.focus_area;
        if let Some(span) = focus.span() {
            let mut chart = Chart::new(ChartType::BarStacked);
            add_savings_series(&mut chart, summary, focus.header_row, span);
            finish_chart(&mut chart, 680, 400);
            sheet.insert_chart(LOWER_CHART_HEADER_ROW + 1, LEFT_PANEL.0, &chart)?;
        }

        Ok(())
    }

    fn write_ranking_table(
        &self,
        sheet: &mut Worksheet,
        aggregates: &Aggregates,
        layout: &SummaryLayout,
        formulas: &FormulaBuilder,
        styles: &Styles,
    ) -> Result<(), ReportError> {
        sheet.merge_range(
            RANK_SECTION_ROW,
            LEFT_PANEL.0,
            RANK_SECTION_ROW,
            LEFT_PANEL.1,
            "TOP PERFORMERS RANKING",
            &styles.section_header,
        )?;
        sheet.set_row_height(RANK_SECTION_ROW, 35)?;

        for (col, header) in RANK_COLS.iter().zip(RANK_HEADERS) {
            sheet.write_string_with_format(RANK_HEADER_ROW, *col, header, &styles.data_header)?;
        }
        sheet.set_row_height(RANK_HEADER_ROW, 28)?;

        let Some(span) = layout.division.span() else {
            return Ok(());
        };

        for (i, ranked) in aggregates.ranking().iter().enumerate() {
            let row = RANK_FIRST_ROW + i as u32;
            let rank_cell = format!("$B{}", row + 1);
            let division = &ranked.summary;
            let plain = styles.rank_cell(ranked.tier, "General");

            sheet.write_number_with_format(row, RANK_COLS[0], ranked.rank as f64, &plain)?;

            let cells: [(u16, Computed, u16, Option<u32>, &str); 6] = [
                (
                    RANK_COLS[1],
                    Computed::Text(division.category.clone()),
                    summary_col::CATEGORY,
                    None,
                    "General",
                ),
                (
                    RANK_COLS[2],
                    Computed::Number(round_to(division.smv_unlock, 3)),
                    summary_col::SMV_UNLOCK,
                    Some(3),
                    "#,##0.000",
                ),
                (
                    RANK_COLS[3],
                    Computed::Number(round_to(division.oh_reduction, 1)),
                    summary_col::OH_REDUCTION,
                    Some(1),
                    "#,##0.0",
                ),
                (
                    RANK_COLS[4],
                    Computed::Number(round_to(division.other_savings, 1)),
                    summary_col::OTHER_SAVINGS,
                    Some(1),
                    "#,##0.0",
                ),
                (
                    RANK_COLS[5],
                    Computed::Number(round_to(division.total_savings(), 2)),
                    summary_col::TOTAL_SAVINGS,
                    Some(2),
                    "#,##0.00",
                ),
                (
                    RANK_COLS[6],
                    Computed::Number(division.solution_count as f64),
                    summary_col::SOLUTION_COUNT,
                    None,
                    "#,##0",
                ),
            ];

            for (col, value, source_col, decimals, num_format) in cells {
                self.strategy.write_computed(
                    sheet,
                    row,
                    col,
                    &value,
                    &formulas.ranked_lookup(span, source_col, &rank_cell, decimals),
                    &styles.rank_cell(ranked.tier, num_format),
                )?;
            }
            sheet.set_row_height(row, 24)?;
        }

        Ok(())
    }

    fn write_insights(
        &self,
        sheet: &mut Worksheet,
        aggregates: &Aggregates,
        layout: &SummaryLayout,
        formulas: &FormulaBuilder,
        styles: &Styles,
    ) -> Result<(), ReportError> {
        sheet.merge_range(
            RANK_SECTION_ROW,
            RIGHT_PANEL.0,
            RANK_SECTION_ROW,
            RIGHT_PANEL.1,
            "KEY INSIGHTS",
            &styles.section_header,
        )?;

        let insights = aggregates.insights();
        let span = layout.division.span();
        let name = |value: &Option<String>| {
            Computed::Text(value.clone().unwrap_or_else(|| "n/a".to_string()))
        };
        let with_span = |build: &dyn Fn(RowSpan) -> String| span.map(build);

        let items = [
            InsightItem {
                label: INSIGHT_LABELS[0],
                value: name(&insights.top_division),
                formula: with_span(&|s: RowSpan| formulas.ranked_lookup(s, summary_col::CATEGORY, "1", None)),
                color: styles::PRIMARY,
                num_format: "General",
            },
            InsightItem {
                label: INSIGHT_LABELS[1],
                value: name(&insights.best_smv_unlock),
                formula: with_span(&|s: RowSpan| formulas.best_by(s, summary_col::SMV_UNLOCK)),
                color: styles::SUCCESS,
                num_format: "General",
            },
            InsightItem {
                label: INSIGHT_LABELS[2],
                value: name(&insights.best_oh_reduction),
                formula: with_span(&|s: RowSpan| formulas.best_by(s, summary_col::OH_REDUCTION)),
                color: styles::ACCENT_ORANGE,
                num_format: "General",
            },
            InsightItem {
                label: INSIGHT_LABELS[3],
                value: name(&insights.best_other_savings),
                formula: with_span(&|s: RowSpan| formulas.best_by(s, summary_col::OTHER_SAVINGS)),
                color: styles::ACCENT_PINK,
                num_format: "General",
            },
            InsightItem {
                label: INSIGHT_LABELS[4],
                value: name(&insights.most_solutions),
                formula: with_span(&|s: RowSpan| formulas.best_by(s, summary_col::SOLUTION_COUNT)),
                color: styles::ACCENT_PURPLE,
                num_format: "General",
            },
            InsightItem {
                label: INSIGHT_LABELS[5],
                value: Computed::Number(insights.divisions_tracked as f64),
                formula: with_span(&|s: RowSpan| formulas.category_count(s)),
                color: styles::ACCENT_VIOLET,
                num_format: "#,##0",
            },
            InsightItem {
                label: INSIGHT_LABELS[6],
                value: Computed::Number(round_to(insights.division_savings, 2)),
                formula: with_span(&|s: RowSpan| {
                    formulas.rounded_column_sum(s, summary_col::TOTAL_SAVINGS, 2)
                }),
                color: styles::SECONDARY,
                num_format: "#,##0.00",
            },
        ];

        let pad = styles.insight_pad();
        for (i, item) in items.iter().enumerate() {
            let row = INSIGHT_FIRST_ROW + i as u32;
            let value_format = styles.insight_value(item.color, item.num_format);

            sheet.merge_range(
                row,
                INSIGHT_LABEL_COLS.0,
                row,
                INSIGHT_LABEL_COLS.1,
                item.label,
                &styles.insight_label(item.color),
            )?;
            sheet.merge_range(
                row,
                INSIGHT_VALUE_COLS.0,
                row,
                INSIGHT_VALUE_COLS.1,
                "",
                &value_format,
            )?;
            match &item.formula {
                Some(formula) => self.strategy.write_computed(
                    sheet,
                    row,
                    INSIGHT_VALUE_COLS.0,
                    &item.value,
                    formula,
                    &value_format,
                )?,
                None => write_value(sheet, row, INSIGHT_VALUE_COLS.0, &item.value, &value_format)?,
            }
            sheet.write_blank(row, INSIGHT_PAD_COL, &pad)?;
        }

        Ok(())
    }
}

fn write_data_sheet(
    sheet: &mut Worksheet,
    records: &[SolutionRecord],
    styles: &Styles,
) -> Result<(), ReportError> {
    for (col, (header, width)) in COLUMNS.iter().zip(DATA_COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *header, &styles.data_header)?;
        sheet.set_column_width(col, width)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        let texts = [
            &record.division,
            &record.solution_name,
            &record.focus_area,
            &record.stage,
        ];
        for (col, text) in texts.into_iter().enumerate() {
            write_optional_text(sheet, row, col as u16, text.as_deref(), &styles.data_text)?;
        }
        for kind in SavingsKind::ALL {
            let value = match kind {
                SavingsKind::SmvUnlock => record.smv_unlock,
                SavingsKind::OhReduction => record.oh_reduction,
                SavingsKind::OtherSavings => record.other_savings,
            };
            match value {
                Some(n) => {
                    sheet.write_number_with_format(row, kind.data_column(), n, &styles.data_number)?
                }
                None => sheet.write_blank(row, kind.data_column(), &styles.data_number)?,
            };
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    if !records.is_empty() {
        sheet.autofilter(0, 0, records.len() as u32, COLUMNS.len() as u16 - 1)?;
    }

    Ok(())
}

fn write_optional_text(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
    format: &Format,
) -> Result<(), ReportError> {
    match value {
        Some(text) => sheet.write_string_with_format(row, col, text, format)?,
        None => sheet.write_blank(row, col, format)?,
    };
    Ok(())
}

fn category_range(sheet: &str, span: RowSpan) -> (&str, u32, u16, u32, u16) {
    value_range(sheet, span, summary_col::CATEGORY)
}

fn value_range(sheet: &str, span: RowSpan, col: u16) -> (&str, u32, u16, u32, u16) {
    (sheet, span.first, col, span.last, col)
}

// One series per savings measure, coloured consistently across charts
fn add_savings_series(chart: &mut Chart, sheet: &str, header_row: u32, span: RowSpan) {
    for kind in SavingsKind::ALL {
        let col = summary_col::savings(kind);
        chart
            .add_series()
            .set_name((sheet, header_row, col))
            .set_categories(category_range(sheet, span))
            .set_values(value_range(sheet, span, col))
            .set_format(
                ChartFormat::new().set_solid_fill(ChartSolidFill::new().set_color(kind.color())),
            );
    }
}

fn finish_chart(chart: &mut Chart, width: u32, height: u32) {
    chart.set_style(10);
    chart.title().set_hidden();
    chart.legend().set_position(ChartLegendPosition::Bottom);
    chart.set_width(width).set_height(height);
}
