//! `raw_*` tables: the extractions as read, before normalization.

use super::facts::{isolation_by_month, FGRS_COST_TYPE, LOGI_COST_TYPE};
use crate::hierarchy::HierarchyRecord;
use crate::sources::{EvolutionLine, SectionSeries, SubcontractorMetric};
use crate::tables::{Table, Value};

pub fn contract_evolution(lines: &[EvolutionLine], amount_columns: usize) -> Table {
    let mut columns = vec!["row_no".to_string(), "description".to_string(), "excel_row".to_string()];
    columns.extend((0..amount_columns).map(|i| match i {
        0 => "original_contract".to_string(),
        n => format!("amd_{}", n),
    }));

    let mut table = Table {
        name: "raw_contract_evolution".to_string(),
        columns,
        rows: Vec::new(),
    };
    for line in lines {
        let mut row = vec![
            line.row_no.clone().into(),
            line.description.clone().into(),
            line.excel_row.into(),
        ];
        row.extend((0..amount_columns).map(|i| Value::from(line.amounts.get(i).copied().flatten())));
        table.push(row);
    }
    table
}

pub fn pamf_claims(claims: &[HierarchyRecord]) -> Table {
    let mut table = Table::new(
        "raw_pamf_claims",
        &[
            "discipline",
            "category",
            "subcategory",
            "label",
            "level",
            "claim_count",
            "claim_amount_usd",
            "excel_row",
        ],
    );
    for claim in claims {
        table.push(vec![
            claim.discipline.clone().into(),
            claim.category.clone().into(),
            claim.subcategory.clone().into(),
            claim.label.clone().into(),
            claim.level.into(),
            claim.count.into(),
            claim.amount.into(),
            claim.excel_row.into(),
        ]);
    }
    table
}

fn cost_series(name: &str, cost_type: &str, series: &SectionSeries) -> Table {
    let mut table = Table::new(name, &["year", "month", "cost_type", "value", "excel_row"]);
    for point in &series.points {
        table.push(vec![
            point.year.into(),
            point.month_number().into(),
            cost_type.into(),
            point.value.into(),
            series.excel_row().into(),
        ]);
    }
    table
}

pub fn fgrs_monthly(series: &SectionSeries) -> Table {
    cost_series("raw_fgrs_monthly", FGRS_COST_TYPE, series)
}

pub fn logi_monthly(series: &SectionSeries) -> Table {
    cost_series("raw_logi_monthly", LOGI_COST_TYPE, series)
}

/// POB points with the isolation count of the same month, blank when none.
pub fn pob_monthly(pob: &SectionSeries, isolation: &SectionSeries) -> Table {
    let isolation = isolation_by_month(&isolation.points);
    let mut table = Table::new("raw_pob_monthly", &["year", "month", "pob_count", "isolation_count"]);
    for point in &pob.points {
        let Some(month) = point.month_number() else {
            continue;
        };
        table.push(vec![
            point.year.into(),
            month.into(),
            point.value.into(),
            isolation.get(&(point.year, month)).copied().into(),
        ]);
    }
    table
}

pub fn subcontractor_monthly(metrics: &[SubcontractorMetric]) -> Table {
    let mut table = Table::new(
        "raw_subcontractor_monthly",
        &["subcontractor", "year", "month", "metric", "value", "raw_label", "excel_row"],
    );
    for metric in metrics {
        for point in &metric.points {
            table.push(vec![
                metric.subcontractor.into(),
                point.year.into(),
                point.month_number().into(),
                Value::Text(metric.metric.to_string()),
                point.value.into(),
                metric.raw_label.clone().into(),
                metric.excel_row.into(),
            ]);
        }
    }
    table
}
