//! Saved chart domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ability::{ResourceDescriptor, ResourceKind};

/// Where a chart lives. A chart belongs to exactly one space or exactly
/// one dashboard, or to neither once its parent has been removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ChartParent {
    Space(Uuid),
    Dashboard(Uuid),
    Orphan,
}

impl ChartParent {
    pub fn space_id(&self) -> Option<Uuid> {
        match self {
            ChartParent::Space(id) => Some(*id),
            _ => None,
        }
    }

    pub fn dashboard_id(&self) -> Option<Uuid> {
        match self {
            ChartParent::Dashboard(id) => Some(*id),
            _ => None,
        }
    }

    /// Rebuild the parent from the two nullable columns it is persisted as.
    /// A dashboard association wins over a space.
    pub fn from_columns(space_id: Option<Uuid>, dashboard_id: Option<Uuid>) -> Self {
        match (dashboard_id, space_id) {
            (Some(dashboard), _) => ChartParent::Dashboard(dashboard),
            (None, Some(space)) => ChartParent::Space(space),
            (None, None) => ChartParent::Orphan,
        }
    }
}

// ---------------------------------------------------------------------------
// Metric query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MetricQuery {
    pub explore_name: String,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub filters: Filters,
    pub sorts: Vec<SortField>,
    pub limit: u32,
    pub table_calculations: Vec<TableCalculation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortField {
    pub field_id: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableCalculation {
    pub name: String,
    pub display_name: String,
    pub sql: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Filters {
    pub dimensions: Option<FilterGroup>,
    pub metrics: Option<FilterGroup>,
    pub table_calculations: Option<FilterGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FilterGroup {
    And(Vec<FilterGroupItem>),
    Or(Vec<FilterGroupItem>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterGroupItem {
    Group(FilterGroup),
    Rule(FilterRule),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterRule {
    pub field_id: String,
    pub operator: String,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
}

impl FilterGroup {
    fn items(&self) -> &[FilterGroupItem] {
        match self {
            FilterGroup::And(items) | FilterGroup::Or(items) => items,
        }
    }

    /// Number of rules in this group, descending into nested groups.
    pub fn count_rules(&self) -> usize {
        self.items()
            .iter()
            .map(|item| match item {
                FilterGroupItem::Group(group) => group.count_rules(),
                FilterGroupItem::Rule(_) => 1,
            })
            .sum()
    }
}

impl Filters {
    pub fn count_rules(&self) -> usize {
        [&self.dimensions, &self.metrics, &self.table_calculations]
            .into_iter()
            .flatten()
            .map(FilterGroup::count_rules)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Chart configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Cartesian,
    Table,
    BigNumber,
    Pie,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum ChartConfig {
    Cartesian(CartesianConfig),
    Table(TableConfig),
    BigNumber(BigNumberConfig),
    Pie(PieConfig),
}

impl ChartConfig {
    pub fn chart_type(&self) -> ChartType {
        match self {
            ChartConfig::Cartesian(_) => ChartType::Cartesian,
            ChartConfig::Table(_) => ChartType::Table,
            ChartConfig::BigNumber(_) => ChartType::BigNumber,
            ChartConfig::Pie(_) => ChartType::Pie,
        }
    }

    /// Conditional formatting rules, for the chart types that support them.
    pub fn conditional_formattings(&self) -> Option<&[ConditionalFormattingConfig]> {
        match self {
            ChartConfig::Table(table) => Some(&table.conditional_formattings),
            _ => None,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig::Table(TableConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CartesianConfig {
    pub x_axis: Vec<Axis>,
    pub y_axis: Vec<Axis>,
    pub series: Vec<Series>,
    pub grid: Option<Grid>,
    pub legend: Option<Legend>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Axis {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeriesType {
    Bar,
    Line,
    Area,
    Scatter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub series_type: SeriesType,
    pub field_id: String,
    #[serde(default)]
    pub mark_line: Option<MarkLine>,
}

/// Reference lines drawn over a series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MarkLine {
    pub data: Option<Vec<ReferenceLine>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceLine {
    pub value: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Grid {
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Legend {
    pub show: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TableConfig {
    pub conditional_formattings: Vec<ConditionalFormattingConfig>,
    pub metrics_as_rows: bool,
    pub show_row_calculation: bool,
    pub show_column_calculation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionalFormattingConfig {
    ColorRange {
        target: Option<String>,
        start_color: String,
        end_color: String,
        min: f64,
        max: f64,
    },
    SingleColor {
        target: Option<String>,
        color: String,
        rules: Vec<FormattingCondition>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormattingCondition {
    pub operator: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BigNumberConfig {
    pub label: Option<String>,
    pub show_comparison: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PieConfig {
    pub is_donut: bool,
}

// ---------------------------------------------------------------------------
// Saved chart
// ---------------------------------------------------------------------------

/// The query and visualization configuration captured by one version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ChartVersionSpec {
    pub table_name: String,
    pub metric_query: MetricQuery,
    pub chart_config: ChartConfig,
    pub pivot_columns: Vec<String>,
}

/// A saved chart as seen by callers: its placement plus its latest version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedChart {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Uuid,
    pub parent: ChartParent,
    /// Effective space: the chart's own space, or its dashboard's space.
    pub space_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub version: u32,
    pub spec: ChartVersionSpec,
    pub pinned_list_id: Option<Uuid>,
    pub updated_by: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl SavedChart {
    pub fn dashboard_id(&self) -> Option<Uuid> {
        self.parent.dashboard_id()
    }
}

/// The minimal attributes needed to authorize an operation on a chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSummary {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub parent: ChartParent,
    /// Effective space: the chart's own space, or its dashboard's space.
    pub space_id: Option<Uuid>,
    pub pinned_list_id: Option<Uuid>,
}

impl ChartSummary {
    pub fn descriptor(&self, kind: ResourceKind) -> ResourceDescriptor {
        ResourceDescriptor {
            kind,
            organization_id: self.organization_id,
            project_id: Some(self.project_id),
            space_id: self.space_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSavedChart {
    pub name: String,
    pub description: Option<String>,
    pub parent: ChartParent,
    pub spec: ChartVersionSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSavedChart {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub description: Option<Option<String>>,
    pub parent: Option<ChartParent>,
}

/// One entry of a bulk update: moves and renames a chart in one go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMultipleSavedChart {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub space_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartViewStats {
    pub views: u64,
    pub first_viewed_at: Option<DateTime<Utc>>,
}
