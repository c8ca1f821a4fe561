//! Event properties derived from post-mutation entity state.

use serde_json::{Map, Value, json};
use tessera_core::models::chart::{ChartConfig, ConditionalFormattingConfig, SavedChart};
use tessera_core::models::pinned_list::PinnedList;
use tessera_core::models::scheduler::Scheduler;
use uuid::Uuid;

/// Shape metrics of a chart's current version.
pub fn version_properties(chart: &SavedChart) -> Map<String, Value> {
    let query = &chart.spec.metric_query;
    let config = &chart.spec.chart_config;

    let mut props = Map::new();
    props.insert("projectId".into(), json!(chart.project_id));
    props.insert("savedQueryId".into(), json!(chart.id));
    props.insert("dimensionsCount".into(), json!(query.dimensions.len()));
    props.insert("metricsCount".into(), json!(query.metrics.len()));
    props.insert("filtersCount".into(), json!(query.filters.count_rules()));
    props.insert("sortsCount".into(), json!(query.sorts.len()));
    props.insert(
        "tableCalculationsCount".into(),
        json!(query.table_calculations.len()),
    );
    props.insert("pivotCount".into(), json!(chart.spec.pivot_columns.len()));
    props.insert("chartType".into(), json!(config.chart_type()));

    match config {
        ChartConfig::Pie(pie) => {
            props.insert("pie".into(), json!({ "isDonut": pie.is_donut }));
        }
        ChartConfig::Table(table) => {
            props.insert(
                "table".into(),
                json!({
                    "conditionalFormattingRulesCount": table.conditional_formattings.len(),
                    "hasMetricsAsRows": table.metrics_as_rows,
                    "hasRowCalculation": table.show_row_calculation,
                    "hasColumnCalculations": table.show_column_calculation,
                }),
            );
        }
        ChartConfig::BigNumber(big_number) => {
            props.insert(
                "bigValue".into(),
                json!({ "hasBigValueComparison": big_number.show_comparison }),
            );
        }
        ChartConfig::Cartesian(cartesian) => {
            let series_types: Vec<Value> = cartesian
                .series
                .iter()
                .map(|series| json!(series.series_type))
                .collect();
            let reference_lines = cartesian
                .series
                .iter()
                .filter(|series| {
                    series
                        .mark_line
                        .as_ref()
                        .is_some_and(|mark_line| mark_line.data.is_some())
                })
                .count();
            let margins = match cartesian.grid.as_ref().and_then(|grid| grid.top.as_ref()) {
                Some(_) => "custom",
                None => "default",
            };
            let show_legend = cartesian
                .legend
                .as_ref()
                .and_then(|legend| legend.show)
                != Some(false);

            props.insert(
                "cartesian".into(),
                json!({
                    "xAxisCount": cartesian.x_axis.len(),
                    "yAxisCount": cartesian.y_axis.len(),
                    "seriesTypes": series_types,
                    "seriesCount": cartesian.series.len(),
                    "referenceLinesCount": reference_lines,
                    "margins": margins,
                    "showLegend": show_legend,
                }),
            );
        }
    }
    props
}

/// One property set per conditional formatting rule, or none when the
/// chart type has no formatting or no rule is configured.
pub fn conditional_formatting_properties(chart: &SavedChart) -> Vec<Value> {
    let Some(rules) = chart.spec.chart_config.conditional_formattings() else {
        return Vec::new();
    };

    rules
        .iter()
        .map(|rule| {
            let (kind, conditions) = match rule {
                ConditionalFormattingConfig::ColorRange { .. } => ("color range", 1),
                ConditionalFormattingConfig::SingleColor { rules, .. } => {
                    ("single color", rules.len())
                }
            };
            json!({
                "projectId": chart.project_id,
                "organizationId": chart.organization_id,
                "savedQueryId": chart.id,
                "type": kind,
                "numConditions": conditions,
            })
        })
        .collect()
}

/// Complete snapshot of a pinned list.
pub fn pinned_list_properties(organization_id: Uuid, list: &PinnedList, location: &str) -> Value {
    let items: Vec<Value> = list
        .items
        .iter()
        .map(|entry| {
            json!({
                "itemId": entry.item.id,
                "itemKind": entry.item.kind.as_str(),
                "order": entry.order,
            })
        })
        .collect();

    json!({
        "projectId": list.project_id,
        "organizationId": organization_id,
        "location": location,
        "pinnedListId": list.id,
        "pinnedItems": items,
    })
}

/// `scheduler.created` properties. `cron_string` is the human-readable
/// rendering of the cron expression.
pub fn scheduler_properties(
    organization_id: Uuid,
    project_id: Uuid,
    scheduler: &Scheduler,
    cron_string: &str,
) -> Value {
    let targets: Vec<Value> = scheduler
        .targets
        .iter()
        .map(|target| {
            json!({
                "schedulerTargetId": target.id(),
                "type": target.type_name(),
            })
        })
        .collect();

    json!({
        "projectId": project_id,
        "organizationId": organization_id,
        "schedulerId": scheduler.id,
        "resourceType": scheduler.owner.resource_type(),
        "resourceId": scheduler.owner.resource_id(),
        "cronExpression": scheduler.cron,
        "cronString": cron_string,
        "format": scheduler.format.as_str(),
        "targets": targets,
    })
}
