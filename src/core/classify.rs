//! Threshold classification and fit-line calculation
//!
//! Every tag is a pure function of the record's own values. Fit lines are
//! derived from the view's mean slope and intercept, not from a regression
//! over the plotted points.

use serde::{Deserialize, Serialize};

use crate::core::dataset::FilteredView;
use crate::core::error::EngineError;
use crate::core::schema::{FieldKind, FitSpec, PlotSpec, SchemaKind};
use crate::core::value::FieldValue;

/// A fixed numeric predicate used for highlighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// Flags values outside the closed band `[low, high]`
    OutsideClosed { low: f64, high: f64 },
    /// Flags values strictly inside `(low, high)`
    InsideOpen { low: f64, high: f64 },
    /// Flags values whose magnitude exceeds `limit`
    AbsAbove { limit: f64 },
}

impl ThresholdRule {
    /// Whether a value trips the rule; missing values never do
    pub fn flags(&self, value: Option<f64>) -> bool {
        let Some(v) = value else {
            return false;
        };
        match *self {
            ThresholdRule::OutsideClosed { low, high } => v > high || v < low,
            ThresholdRule::InsideOpen { low, high } => v > low && v < high,
            ThresholdRule::AbsAbove { limit } => v > limit || v < -limit,
        }
    }

    pub fn tag(&self, value: Option<f64>) -> Tag {
        let flagged = self.flags(value);
        match (self, flagged) {
            (ThresholdRule::OutsideClosed { .. }, false) => Tag::InRange,
            (ThresholdRule::OutsideClosed { .. }, true) => Tag::OutOfRange,
            (ThresholdRule::InsideOpen { .. }, false) => Tag::Normal,
            (ThresholdRule::InsideOpen { .. }, true) => Tag::Anomalous,
            (ThresholdRule::AbsAbove { .. }, false) => Tag::WithinLimit,
            (ThresholdRule::AbsAbove { .. }, true) => Tag::ExceedsLimit,
        }
    }
}

/// Colour tag attached to a point or cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    InRange,
    OutOfRange,
    Normal,
    Anomalous,
    WithinLimit,
    ExceedsLimit,
}

impl Tag {
    pub fn is_flagged(&self) -> bool {
        matches!(self, Tag::OutOfRange | Tag::Anomalous | Tag::ExceedsLimit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::InRange => "in-range",
            Tag::OutOfRange => "out-of-range",
            Tag::Normal => "normal",
            Tag::Anomalous => "anomalous",
            Tag::WithinLimit => "within-limit",
            Tag::ExceedsLimit => "exceeds-limit",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rule bound to a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub column: String,
    #[serde(flatten)]
    pub rule: ThresholdRule,
}

impl ColumnRule {
    pub fn new(column: &str, rule: ThresholdRule) -> Self {
        Self {
            column: column.to_string(),
            rule,
        }
    }
}

/// Scatter and table rules for one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Rules that colour plot points
    pub scatter: Vec<ColumnRule>,
    /// Rules that highlight table cells
    pub table: Vec<ColumnRule>,
}

/// Coarse X is valid in `[478.5, 481.5]`
pub const COARSE_X_VALID: ThresholdRule = ThresholdRule::OutsideClosed {
    low: 478.5,
    high: 481.5,
};

/// Coarse Y is valid in `[403.5, 406.5]`
pub const COARSE_Y_VALID: ThresholdRule = ThresholdRule::OutsideClosed {
    low: 403.5,
    high: 406.5,
};

/// DAD position band treated as anomalous
pub const TAD_DAD_BAND: ThresholdRule = ThresholdRule::InsideOpen {
    low: 15.0,
    high: 20.0,
};

/// Slope magnitude highlighted in TAD tables
pub const TAD_SLOPE_LIMIT: ThresholdRule = ThresholdRule::AbsAbove { limit: 8.0 };

/// Highlighting rules for both schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub coarse: RuleSet,
    pub tad: RuleSet,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            coarse: RuleSet {
                scatter: vec![
                    ColumnRule::new("X", COARSE_X_VALID),
                    ColumnRule::new("Y", COARSE_Y_VALID),
                ],
                table: vec![
                    ColumnRule::new("X", COARSE_X_VALID),
                    ColumnRule::new("Y", COARSE_Y_VALID),
                ],
            },
            tad: RuleSet {
                scatter: vec![
                    ColumnRule::new("DAD_Pos_X", TAD_DAD_BAND),
                    ColumnRule::new("DAD_Pos_Y", TAD_DAD_BAND),
                ],
                table: vec![
                    ColumnRule::new("Slope_X", TAD_SLOPE_LIMIT),
                    ColumnRule::new("Slope_Y", TAD_SLOPE_LIMIT),
                ],
            },
        }
    }
}

impl Thresholds {
    pub fn rules(&self, schema: SchemaKind) -> &RuleSet {
        match schema {
            SchemaKind::Coarse => &self.coarse,
            SchemaKind::Tad => &self.tad,
        }
    }
}

/// One scatter point with its colour tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    /// Dataset row the point came from
    pub row: usize,
    pub x: FieldValue,
    pub y: Option<f64>,
    pub tag: Tag,
}

/// A point on a fit line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitPoint {
    pub x: f64,
    pub y: f64,
}

/// Fit line derived from a view's aggregate statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitLine {
    pub mean_slope: f64,
    pub mean_intercept: f64,
    /// Amplified slope actually plotted
    pub custom_slope: f64,
    pub points: Vec<FitPoint>,
}

/// Classified series for one plot spec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSeries {
    pub title: &'static str,
    pub x_column: &'static str,
    pub y_column: &'static str,
    pub points: Vec<ScatterPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitLine>,
}

impl PlotSeries {
    pub fn flagged_count(&self) -> usize {
        self.points.iter().filter(|p| p.tag.is_flagged()).count()
    }
}

/// A highlighted table cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellFlag {
    pub column: &'static str,
    pub tag: Tag,
}

/// Table highlighting for one view row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFlags {
    pub row: usize,
    pub cells: Vec<CellFlag>,
}

impl RowFlags {
    /// Whether a given column is highlighted in this row
    pub fn is_flagged(&self, column: &str) -> bool {
        self.cells
            .iter()
            .any(|c| c.column == column && c.tag.is_flagged())
    }
}

/// Everything derived from a view for plotting and tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub schema: SchemaKind,
    pub plots: Vec<PlotSeries>,
    pub table: Vec<RowFlags>,
}

impl Classification {
    pub fn plot(&self, title: &str) -> Option<&PlotSeries> {
        self.plots.iter().find(|p| p.title == title)
    }

    pub fn is_empty(&self) -> bool {
        self.plots.iter().all(|p| p.points.is_empty()) && self.table.is_empty()
    }
}

/// Classify every record of a view and compute fit lines
pub fn classify(
    view: &FilteredView<'_>,
    thresholds: &Thresholds,
) -> Result<Classification, EngineError> {
    let dataset = view.dataset();
    let desc = dataset.descriptor();
    let rules = thresholds.rules(dataset.schema());

    let plots = desc
        .plots
        .iter()
        .map(|spec| plot_series(view, spec, &rules.scatter))
        .collect::<Result<Vec<_>, _>>()?;

    let table_rules = bind_rules(view, &rules.table)?;
    let mut table = Vec::with_capacity(view.len());
    for (pos, row) in view.row_indices().iter().enumerate() {
        let mut cells = Vec::with_capacity(table_rules.len());
        for (column, index, rule) in &table_rules {
            let value = numeric(view, pos, *index)?;
            cells.push(CellFlag {
                column: *column,
                tag: rule.tag(value),
            });
        }
        table.push(RowFlags { row: *row, cells });
    }

    Ok(Classification {
        schema: dataset.schema(),
        plots,
        table,
    })
}

/// Resolve rule columns against the schema; each must be a real column
fn bind_rules(
    view: &FilteredView<'_>,
    rules: &[ColumnRule],
) -> Result<Vec<(&'static str, usize, ThresholdRule)>, EngineError> {
    let desc = view.dataset().descriptor();
    rules
        .iter()
        .map(|r| {
            let index = desc.field_index(&r.column)?;
            let field = desc.field(index);
            if field.kind == FieldKind::Text {
                return Err(EngineError::SchemaMismatch {
                    schema: desc.kind,
                    name: r.column.clone(),
                    context: "numeric field",
                });
            }
            Ok((field.name, index, r.rule))
        })
        .collect()
}

fn plot_series(
    view: &FilteredView<'_>,
    spec: &PlotSpec,
    scatter_rules: &[ColumnRule],
) -> Result<PlotSeries, EngineError> {
    let desc = view.dataset().descriptor();
    let x_index = desc.field_index(spec.x)?;
    let y_index = desc.field_index(spec.y)?;

    let applicable: Vec<ColumnRule> = spec
        .color_by
        .iter()
        .filter_map(|col| scatter_rules.iter().find(|r| r.column == *col).cloned())
        .collect();
    let bound = bind_rules(view, &applicable)?;

    let mut points = Vec::with_capacity(view.len());
    for (pos, row) in view.row_indices().iter().enumerate() {
        let mut tags = Vec::with_capacity(bound.len());
        for (_, index, rule) in &bound {
            tags.push(rule.tag(numeric(view, pos, *index)?));
        }
        let tag = combine(&tags);
        points.push(ScatterPoint {
            row: *row,
            x: view.dataset().records()[*row].get(x_index).clone(),
            y: numeric(view, pos, y_index)?,
            tag,
        });
    }

    let fit = match spec.fit {
        Some(fit) => Some(fit_line(view, &fit)?),
        None => None,
    };

    Ok(PlotSeries {
        title: spec.title,
        x_column: spec.x,
        y_column: spec.y,
        points,
        fit,
    })
}

/// First flagged tag wins; otherwise the first rule's clear tag
fn combine(tags: &[Tag]) -> Tag {
    tags.iter()
        .copied()
        .find(Tag::is_flagged)
        .or_else(|| tags.first().copied())
        .unwrap_or(Tag::InRange)
}

/// Numeric value at a view position, failing on non-numeric data
fn numeric(view: &FilteredView<'_>, pos: usize, index: usize) -> Result<Option<f64>, EngineError> {
    let dataset = view.dataset();
    let row = view.row_indices()[pos];
    match dataset.records()[row].get(index) {
        FieldValue::Null => Ok(None),
        FieldValue::Integer(i) => Ok(Some(*i as f64)),
        FieldValue::Real(f) => Ok((!f.is_nan()).then_some(*f)),
        other @ FieldValue::Text(_) => {
            let field = dataset.descriptor().field(index);
            Err(EngineError::TypeCoercion {
                tool_id: dataset.tool_id().to_string(),
                column: field.name.to_string(),
                row: row + 1,
                found: other.describe(),
                expected: FieldKind::Real,
            })
        }
    }
}

/// Mean of a column's non-null values; 0 when the column is absent or has none
pub fn column_mean(view: &FilteredView<'_>, index: usize) -> Result<f64, EngineError> {
    if !view.dataset().has_column(index) {
        return Ok(0.0);
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for pos in 0..view.len() {
        if let Some(v) = numeric(view, pos, index)? {
            sum += v;
            count += 1;
        }
    }
    Ok(if count == 0 { 0.0 } else { sum / count as f64 })
}

/// Fit line `custom_slope * x + mean_intercept` over the view's independent values
pub fn fit_line(view: &FilteredView<'_>, spec: &FitSpec) -> Result<FitLine, EngineError> {
    let desc = view.dataset().descriptor();
    let slope_index = desc.field_index(spec.slope)?;
    let intercept_index = desc.field_index(spec.intercept)?;
    let x_index = desc.field_index(spec.independent)?;
    let y_index = desc.field_index(spec.dependent)?;

    let mean_slope = column_mean(view, slope_index)?;
    let mean_intercept = column_mean(view, intercept_index)?;
    let custom_slope = spec.slope_factor * mean_slope;

    let mut points = Vec::new();
    // Either plotted axis missing leaves nothing to draw against
    if view.dataset().has_column(x_index) && view.dataset().has_column(y_index) {
        for pos in 0..view.len() {
            if let Some(x) = numeric(view, pos, x_index)? {
                points.push(FitPoint {
                    x,
                    y: custom_slope * x + mean_intercept,
                });
            }
        }
    }

    Ok(FitLine {
        mean_slope,
        mean_intercept,
        custom_slope,
        points,
    })
}
