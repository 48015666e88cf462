//! Workbook rendering for advisor reports.
//!
//! Rendering happens in two steps. [`ReportLayout::plan`] validates every
//! worksheet name up front, then [`ReportRenderer::render`] builds the whole
//! workbook in memory and returns its bytes.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rust_xlsxwriter::{
    Chart, ChartFormat, ChartSolidFill, ChartType, Color, Format, FormatAlign, FormatBorder,
    Formula, Url, Workbook, Worksheet,
};

use crate::aggregator::Aggregation;
use crate::domain::{CATEGORY_COLUMNS, CategoryPercentage, Impact, OVERVIEW_COLUMNS, RenderRow};
use crate::error::{ReportError, Result};

/// Name of the summary worksheet.
pub const OVERVIEW_SHEET: &str = "Overview";

/// Default file name prefix for generated reports.
pub const DEFAULT_REPORT_PREFIX: &str = "azure-advisor-excel-reporter";

/// Extension of generated reports.
pub const REPORT_EXTENSION: &str = "xlsx";

/// Longest worksheet name the format accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const RESERVED_SHEET_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

const CHART_TITLE: &str = "Azure Advisor Recommendations by Category (%)";
const CHART_WIDTH: u32 = 960;
const CHART_HEIGHT: u32 = 576;
const PERCENT_FORMAT: &str = "0.00\"%\"";

/// Build `<prefix>_<YYYY-MM-DD_HH-MM-SS>.xlsx`.
pub fn report_file_name(prefix: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{prefix}_{}.{REPORT_EXTENSION}",
        timestamp.format("%Y-%m-%d_%H-%M-%S")
    )
}

/// Fill color for rows and chart series of a severity.
pub fn impact_color(impact: Impact) -> Color {
    match impact {
        Impact::High => Color::RGB(0xFFEBEB),
        Impact::Medium => Color::RGB(0xFFF2CC),
        Impact::Low => Color::RGB(0xD9EAD3),
    }
}

/// A label accepted as a worksheet name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetName(String);

impl SheetName {
    /// Validate `label` against the worksheet naming rules.
    pub fn parse(label: &str) -> Result<Self> {
        let reject = |reason: String| ReportError::InvalidSheetName {
            name: label.to_string(),
            reason,
        };
        if label.is_empty() {
            return Err(reject("name is empty".to_string()));
        }
        let len = label.chars().count();
        if len > MAX_SHEET_NAME_LEN {
            return Err(reject(format!(
                "{len} characters exceeds the {MAX_SHEET_NAME_LEN} character limit"
            )));
        }
        if let Some(ch) = label.chars().find(|ch| RESERVED_SHEET_CHARS.contains(ch)) {
            return Err(reject(format!("contains reserved character '{ch}'")));
        }
        if label.starts_with('\'') || label.ends_with('\'') {
            return Err(reject("begins or ends with an apostrophe".to_string()));
        }
        Ok(Self(label.to_string()))
    }

    /// The validated name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Same-document link target pointing at cell `A1` of this sheet.
    pub fn internal_link(&self) -> String {
        format!("internal:'{}'!A1", self.0.replace('\'', "''"))
    }
}

/// One category worksheet to write.
#[derive(Debug, Clone)]
pub struct CategorySheet<'a> {
    /// Validated worksheet name.
    pub name: SheetName,
    /// Rows in arrival order.
    pub rows: &'a [RenderRow],
}

/// Validated shape of a workbook, ready to render.
#[derive(Debug, Clone)]
pub struct ReportLayout<'a> {
    overview: &'a [CategoryPercentage],
    sheets: IndexMap<&'a str, CategorySheet<'a>>,
}

impl<'a> ReportLayout<'a> {
    /// Validate sheet names for every non-empty category.
    ///
    /// Fails before anything is written if a category cannot become a
    /// worksheet or two categories would share one.
    pub fn plan(
        aggregation: &'a Aggregation,
        percentages: &'a [CategoryPercentage],
    ) -> Result<Self> {
        let mut taken = HashSet::from([OVERVIEW_SHEET.to_lowercase()]);
        let mut sheets = IndexMap::new();
        for bucket in aggregation.buckets() {
            if bucket.is_empty() {
                continue;
            }
            let name = SheetName::parse(&bucket.category)?;
            if !taken.insert(name.as_str().to_lowercase()) {
                return Err(ReportError::InvalidSheetName {
                    name: bucket.category.clone(),
                    reason: "collides with another worksheet name".to_string(),
                });
            }
            sheets.insert(
                bucket.category.as_str(),
                CategorySheet {
                    name,
                    rows: &bucket.rows,
                },
            );
        }
        Ok(Self {
            overview: percentages,
            sheets,
        })
    }

    /// Overview rows in first-seen order.
    pub fn overview(&self) -> &[CategoryPercentage] {
        self.overview
    }

    /// Category worksheets in first-seen order.
    pub fn sheets(&self) -> impl ExactSizeIterator<Item = &CategorySheet<'a>> {
        self.sheets.values()
    }

    /// Every worksheet name, overview first.
    pub fn sheet_names(&self) -> Vec<&str> {
        std::iter::once(OVERVIEW_SHEET)
            .chain(self.sheets.values().map(|sheet| sheet.name.as_str()))
            .collect()
    }

    fn sheet_for(&self, category: &str) -> Option<&SheetName> {
        self.sheets.get(category).map(|sheet| &sheet.name)
    }
}

/// Writes a [`ReportLayout`] into an xlsx workbook.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    header: Format,
    percent: Format,
    high: Format,
    medium: Format,
    low: Format,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    /// Create a renderer with the standard report styling.
    pub fn new() -> Self {
        let header = Format::new()
            .set_bold()
            .set_text_wrap()
            .set_align(FormatAlign::Top)
            .set_background_color(Color::RGB(0xD9E1F2))
            .set_font_color(Color::Black)
            .set_border(FormatBorder::Thin)
            .set_font_name("Arial");
        let row = |impact| {
            Format::new()
                .set_background_color(impact_color(impact))
                .set_border(FormatBorder::Thin)
                .set_font_name("Arial")
        };
        Self {
            header,
            percent: Format::new().set_num_format(PERCENT_FORMAT),
            high: row(Impact::High),
            medium: row(Impact::Medium),
            low: row(Impact::Low),
        }
    }

    /// Build the workbook and return the serialized xlsx bytes.
    pub fn render(&self, layout: &ReportLayout<'_>) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        let overview = workbook.add_worksheet();
        overview.set_name(OVERVIEW_SHEET)?;
        self.write_overview(overview, layout)?;

        for sheet in layout.sheets() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name.as_str())?;
            self.write_category(worksheet, sheet.rows)?;
        }

        Ok(workbook.save_to_buffer()?)
    }

    fn write_overview(&self, worksheet: &mut Worksheet, layout: &ReportLayout<'_>) -> Result<()> {
        self.write_header(worksheet, &OVERVIEW_COLUMNS)?;

        for (index, entry) in layout.overview().iter().enumerate() {
            let row = to_row(index + 1)?;
            match layout.sheet_for(&entry.category) {
                Some(name) => {
                    worksheet.write_url_with_text(
                        row,
                        0,
                        Url::new(name.internal_link()),
                        entry.category.as_str(),
                    )?;
                }
                None => {
                    worksheet.write_string(row, 0, entry.category.as_str())?;
                }
            }
            for (offset, impact) in Impact::ALL.into_iter().enumerate() {
                worksheet.write_number_with_format(
                    row,
                    to_col(offset + 1)?,
                    entry.get(impact),
                    &self.percent,
                )?;
            }
        }

        let last_row = to_row(layout.overview().len())?;
        worksheet.autofilter(0, 0, last_row, to_col(OVERVIEW_COLUMNS.len() - 1)?)?;

        if last_row > 0 {
            let chart = severity_chart(last_row);
            worksheet.insert_chart(1, 5, &chart)?;
        }
        Ok(())
    }

    fn write_category(&self, worksheet: &mut Worksheet, rows: &[RenderRow]) -> Result<()> {
        self.write_header(worksheet, &CATEGORY_COLUMNS)?;

        for (index, entry) in rows.iter().enumerate() {
            let row = to_row(index + 1)?;
            let format = self.impact_format(entry.impact);
            worksheet.write_string_with_format(row, 0, entry.impact.as_str(), format)?;
            let identity = [
                &entry.subscription_id,
                &entry.resource_group,
                &entry.resource_type,
                &entry.resource_name,
            ];
            for (offset, value) in identity.into_iter().enumerate() {
                let col = to_col(offset + 1)?;
                match value {
                    Some(value) => {
                        worksheet.write_string_with_format(row, col, value.as_str(), format)?;
                    }
                    None => {
                        worksheet.write_blank(row, col, format)?;
                    }
                }
            }
            worksheet.write_string_with_format(row, 5, entry.description.as_str(), format)?;
            worksheet.write_formula_with_format(
                row,
                6,
                Formula::new(entry.link_formula.as_str()),
                format,
            )?;
        }

        worksheet.autofilter(
            0,
            0,
            to_row(rows.len())?,
            to_col(CATEGORY_COLUMNS.len() - 1)?,
        )?;
        Ok(())
    }

    fn write_header(&self, worksheet: &mut Worksheet, columns: &[&str]) -> Result<()> {
        for (index, title) in columns.iter().enumerate() {
            worksheet.write_string_with_format(0, to_col(index)?, *title, &self.header)?;
        }
        Ok(())
    }

    fn impact_format(&self, impact: Impact) -> &Format {
        match impact {
            Impact::High => &self.high,
            Impact::Medium => &self.medium,
            Impact::Low => &self.low,
        }
    }
}

fn severity_chart(last_row: u32) -> Chart {
    let mut chart = Chart::new(ChartType::ColumnStacked);
    for (offset, impact) in Impact::ALL.into_iter().enumerate() {
        let col = (offset + 1) as u16;
        chart
            .add_series()
            .set_name(impact.as_str())
            .set_categories((OVERVIEW_SHEET, 1, 0, last_row, 0))
            .set_values((OVERVIEW_SHEET, 1, col, last_row, col))
            .set_format(
                ChartFormat::new()
                    .set_solid_fill(ChartSolidFill::new().set_color(impact_color(impact))),
            );
    }
    chart.title().set_name(CHART_TITLE);
    chart.x_axis().set_name("Category");
    chart.y_axis().set_name("Percentage");
    chart.set_width(CHART_WIDTH).set_height(CHART_HEIGHT);
    chart
}

fn to_row(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| ReportError::Render(format!("row {index} out of range")))
}

fn to_col(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| ReportError::Render(format!("column {index} out of range")))
}
