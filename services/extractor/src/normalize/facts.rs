//! `tb_t_*` fact tables.

use super::reference_tables::{is_revised_total, CategoryIndex};
use crate::classify::CanonicalMetric;
use crate::hierarchy::HierarchyRecord;
use crate::reference::{amendment_id, discipline_group, subcontractor_id, AMENDMENTS, PROJECT_ID};
use crate::series::{sort_chronologically, TimeSeriesPoint};
use crate::sources::{EvolutionLine, SubcontractorMetric};
use crate::tables::{Record, Value};
use std::collections::{BTreeMap, HashMap};

pub const FGRS_COST_TYPE: &str = "FGRS_RCE";
pub const LOGI_COST_TYPE: &str = "LOGI_RCE";

// ----------------------------------------------------------------------------
// Contract values
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ContractValueRow {
    pub id: i64,
    pub amendment_id: i64,
    pub cost_category_id: i64,
    pub description: String,
    pub amount_usd: Option<f64>,
}

impl Record for ContractValueRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "amendment_id",
        "cost_category_id",
        "description",
        "amount_usd",
        "remarks",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.amendment_id.into(),
            self.cost_category_id.into(),
            self.description.clone().into(),
            self.amount_usd.into(),
            Value::Null,
        ]
    }
}

/// Long format: one row per (amendment, line item), amendments outermost.
/// Blank amounts are kept to show where a line first appears.
pub fn contract_values(lines: &[EvolutionLine], categories: &CategoryIndex) -> Vec<ContractValueRow> {
    let items: Vec<(&EvolutionLine, i64)> = lines
        .iter()
        .zip(&categories.line_category)
        .filter(|(line, _)| !is_revised_total(line))
        .filter_map(|(line, category)| category.map(|id| (line, id)))
        .collect();

    let mut rows = Vec::with_capacity(items.len() * AMENDMENTS.len());
    for index in 0..AMENDMENTS.len() {
        for (line, category_id) in &items {
            rows.push(ContractValueRow {
                id: rows.len() as i64 + 1,
                amendment_id: amendment_id(index),
                cost_category_id: *category_id,
                description: line.description.clone(),
                amount_usd: line.amounts.get(index).copied().flatten(),
            });
        }
    }
    rows
}

// ----------------------------------------------------------------------------
// Monthly cost
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCostRow {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub cost_type: &'static str,
    pub monthly_amount_musd: f64,
    pub cumulative_amount_musd: Option<f64>,
}

impl Record for MonthlyCostRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "project_id",
        "year",
        "month",
        "cost_type",
        "monthly_amount_musd",
        "cumulative_amount_musd",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            PROJECT_ID.into(),
            self.year.into(),
            self.month.into(),
            self.cost_type.into(),
            self.monthly_amount_musd.into(),
            self.cumulative_amount_musd.into(),
        ]
    }
}

fn monthly(points: &[TimeSeriesPoint]) -> Vec<(i32, u32, f64)> {
    let mut points = points.to_vec();
    sort_chronologically(&mut points);
    points
        .iter()
        .filter_map(|p| p.month_number().map(|m| (p.year, m, p.value)))
        .collect()
}

/// FGRS is monthly spend with a running total. LOGI is reported either as
/// monthly spend or as a cumulative curve; a non-decreasing series is read
/// as the latter and differenced back into monthly amounts.
pub fn monthly_costs(fgrs: &[TimeSeriesPoint], logi: &[TimeSeriesPoint]) -> Vec<MonthlyCostRow> {
    let mut rows = Vec::new();

    let mut running = 0.0;
    for (year, month, value) in monthly(fgrs) {
        running += value;
        rows.push(MonthlyCostRow {
            id: rows.len() as i64 + 1,
            year,
            month,
            cost_type: FGRS_COST_TYPE,
            monthly_amount_musd: value,
            cumulative_amount_musd: Some(running),
        });
    }

    let logi = monthly(logi);
    let cumulative = is_non_decreasing(logi.iter().map(|(_, _, v)| *v));
    let mut previous: Option<f64> = None;
    for (year, month, value) in logi {
        let (amount, total) = if cumulative {
            (value - previous.unwrap_or(0.0), Some(value))
        } else {
            (value, None)
        };
        previous = Some(value);
        rows.push(MonthlyCostRow {
            id: rows.len() as i64 + 1,
            year,
            month,
            cost_type: LOGI_COST_TYPE,
            monthly_amount_musd: amount,
            cumulative_amount_musd: total,
        });
    }

    rows
}

fn is_non_decreasing(values: impl Iterator<Item = f64>) -> bool {
    let values: Vec<f64> = values.collect();
    values.windows(2).all(|w| w[0] <= w[1])
}

// ----------------------------------------------------------------------------
// Monthly POB
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPobRow {
    pub id: i64,
    pub year: i32,
    pub month: u32,
    pub pob_count: i64,
    pub isolation_count: i64,
}

impl Record for MonthlyPobRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "project_id",
        "year",
        "month",
        "pob_count",
        "isolation_count",
        "remarks",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            PROJECT_ID.into(),
            self.year.into(),
            self.month.into(),
            self.pob_count.into(),
            self.isolation_count.into(),
            Value::Null,
        ]
    }
}

/// Isolation counts keyed by `(year, month)`, first value winning.
pub fn isolation_by_month(isolation: &[TimeSeriesPoint]) -> HashMap<(i32, u32), f64> {
    let mut by_month = HashMap::new();
    for (year, month, value) in monthly(isolation) {
        by_month.entry((year, month)).or_insert(value);
    }
    by_month
}

/// POB left-joined with isolation; months without isolation count 0.
pub fn monthly_pob(pob: &[TimeSeriesPoint], isolation: &[TimeSeriesPoint]) -> Vec<MonthlyPobRow> {
    let isolation = isolation_by_month(isolation);
    monthly(pob)
        .into_iter()
        .enumerate()
        .map(|(index, (year, month, value))| MonthlyPobRow {
            id: index as i64 + 1,
            year,
            month,
            pob_count: value.round() as i64,
            isolation_count: isolation
                .get(&(year, month))
                .map(|v| v.round() as i64)
                .unwrap_or(0),
        })
        .collect()
}

// ----------------------------------------------------------------------------
// PAMF claims
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PamfClaimRow {
    pub id: i64,
    pub discipline_id: Option<i64>,
    pub discipline: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub pamf_group: &'static str,
    pub label: String,
    pub level: i32,
    pub pamf_count: Option<i64>,
    pub claim_amount_usd: Option<f64>,
}

impl Record for PamfClaimRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "project_id",
        "discipline_id",
        "discipline",
        "category",
        "subcategory",
        "pamf_group",
        "label",
        "level",
        "pamf_count",
        "claim_amount_usd",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            PROJECT_ID.into(),
            self.discipline_id.into(),
            self.discipline.clone().into(),
            self.category.clone().into(),
            self.subcategory.clone().into(),
            self.pamf_group.into(),
            self.label.clone().into(),
            self.level.into(),
            self.pamf_count.into(),
            self.claim_amount_usd.into(),
        ]
    }
}

/// Claim records of levels 0..=2; the grand total and deeper rows are left
/// out.
pub fn pamf_claims(claims: &[HierarchyRecord], discipline_ids: &HashMap<&str, i64>) -> Vec<PamfClaimRow> {
    claims
        .iter()
        .filter(|c| (0..=2).contains(&c.level))
        .enumerate()
        .map(|(index, claim)| {
            let discipline = claim.discipline.as_deref();
            PamfClaimRow {
                id: index as i64 + 1,
                discipline_id: discipline.and_then(|d| discipline_ids.get(d).copied()),
                discipline: claim.discipline.clone(),
                category: claim.category.clone(),
                subcategory: claim.subcategory.clone(),
                pamf_group: discipline_group(discipline.unwrap_or("")),
                label: claim.label.clone(),
                level: claim.level,
                pamf_count: claim.count.map(|c| c.round() as i64),
                claim_amount_usd: claim.amount,
            }
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Variation orders
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VariationOrderRow {
    pub vo_id: i64,
    pub vo_number: String,
    pub vo_name: String,
    pub amount_usd: f64,
    pub approved_in_amendment: i64,
}

impl Record for VariationOrderRow {
    const COLUMNS: &'static [&'static str] = &[
        "vo_id",
        "project_id",
        "vo_number",
        "vo_name",
        "amount_usd",
        "status",
        "approved_in_amendment",
        "approved_date",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.vo_id.into(),
            PROJECT_ID.into(),
            self.vo_number.clone().into(),
            self.vo_name.clone().into(),
            self.amount_usd.into(),
            "APPROVED".into(),
            self.approved_in_amendment.into(),
            Value::Null,
        ]
    }
}

/// A description mentions a variation order when it says "variation" or
/// carries a `VO` token (`VO`, `VOs`, `VO12`).
pub fn is_variation_order(description: &str) -> bool {
    if description.to_lowercase().contains("variation") {
        return true;
    }
    description
        .split(|c: char| !c.is_ascii_alphanumeric())
        .map(str::to_ascii_uppercase)
        .any(|token| match token.strip_prefix("VO") {
            Some(rest) => rest.is_empty() || rest == "S" || rest.chars().all(|c| c.is_ascii_digit()),
            None => false,
        })
}

pub fn variation_orders(lines: &[EvolutionLine]) -> Vec<VariationOrderRow> {
    let mut rows = Vec::new();
    for line in lines.iter().filter(|l| is_variation_order(&l.description)) {
        for (index, amount) in line.amounts.iter().enumerate().take(AMENDMENTS.len()) {
            let Some(amount) = amount else {
                continue;
            };
            rows.push(VariationOrderRow {
                vo_id: rows.len() as i64 + 1,
                vo_number: line.row_no().to_string(),
                vo_name: line.description.clone(),
                amount_usd: *amount,
                approved_in_amendment: amendment_id(index),
            });
        }
    }
    rows
}

// ----------------------------------------------------------------------------
// Subcontractor metrics
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SubcontractorMonthlyRow {
    pub id: i64,
    pub subcontractor_id: Option<i64>,
    pub subcontractor: &'static str,
    pub year: i32,
    pub month: u32,
    pub metric: String,
    pub value: f64,
    pub raw_label: String,
    pub excel_row: usize,
}

impl Record for SubcontractorMonthlyRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "subcontractor_id",
        "subcontractor",
        "year",
        "month",
        "metric",
        "value",
        "raw_label",
        "excel_row",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.subcontractor_id.into(),
            self.subcontractor.into(),
            self.year.into(),
            self.month.into(),
            self.metric.clone().into(),
            self.value.into(),
            self.raw_label.clone().into(),
            self.excel_row.into(),
        ]
    }
}

/// Long format, one row per point, in sheet order.
pub fn subcontractor_monthly(metrics: &[SubcontractorMetric]) -> Vec<SubcontractorMonthlyRow> {
    let mut rows = Vec::new();
    for metric in metrics {
        for point in &metric.points {
            let Some(month) = point.month_number() else {
                continue;
            };
            rows.push(SubcontractorMonthlyRow {
                id: rows.len() as i64 + 1,
                subcontractor_id: subcontractor_id(metric.subcontractor),
                subcontractor: metric.subcontractor,
                year: point.year,
                month,
                metric: metric.metric.to_string(),
                value: point.value,
                raw_label: metric.raw_label.clone(),
                excel_row: metric.excel_row,
            });
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectProgressRow {
    pub id: i64,
    pub subcontractor_id: Option<i64>,
    pub subcontractor: &'static str,
    pub year: i32,
    pub month: u32,
    pub plan_progress_pct: Option<f64>,
    pub overall_progress_pct: Option<f64>,
    pub monthly_progress_plan: Option<f64>,
    pub monthly_progress_actual: Option<f64>,
}

impl Record for ProjectProgressRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "project_id",
        "subcontractor_id",
        "subcontractor",
        "year",
        "month",
        "plan_progress_pct",
        "overall_progress_pct",
        "monthly_progress_plan",
        "monthly_progress_actual",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            PROJECT_ID.into(),
            self.subcontractor_id.into(),
            self.subcontractor.into(),
            self.year.into(),
            self.month.into(),
            self.plan_progress_pct.into(),
            self.overall_progress_pct.into(),
            self.monthly_progress_plan.into(),
            self.monthly_progress_actual.into(),
        ]
    }
}

/// Progress metrics pivoted to one row per (subcontractor, year, month).
/// When two rows report the same metric for a month, the first one wins.
pub fn project_progress(metrics: &[SubcontractorMetric]) -> Vec<ProjectProgressRow> {
    let mut pivot: BTreeMap<(i64, &'static str, i32, u32), [Option<f64>; 4]> = BTreeMap::new();

    for metric in metrics {
        let slot = match metric.metric.canonical() {
            Some(CanonicalMetric::CumulativeProgressPlan) => 0,
            Some(CanonicalMetric::CumulativeProgressActual) => 1,
            Some(CanonicalMetric::MonthlyProgressPlan) => 2,
            Some(CanonicalMetric::MonthlyProgressActual) => 3,
            _ => continue,
        };
        let order = subcontractor_id(metric.subcontractor).unwrap_or(i64::MAX);
        for point in &metric.points {
            let Some(month) = point.month_number() else {
                continue;
            };
            let values = pivot
                .entry((order, metric.subcontractor, point.year, month))
                .or_default();
            values[slot].get_or_insert(point.value);
        }
    }

    pivot
        .into_iter()
        .enumerate()
        .map(|(index, ((_, subcontractor, year, month), values))| ProjectProgressRow {
            id: index as i64 + 1,
            subcontractor_id: subcontractor_id(subcontractor),
            subcontractor,
            year,
            month,
            plan_progress_pct: values[0],
            overall_progress_pct: values[1],
            monthly_progress_plan: values[2],
            monthly_progress_actual: values[3],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MetricName;
    use crate::normalize::reference_tables::cost_categories;
    use pretty_assertions::assert_eq;

    fn p(year: i32, month: u32, value: f64) -> TimeSeriesPoint {
        TimeSeriesPoint::monthly(year, month, value)
    }

    fn line(row_no: &str, description: &str, amounts: &[Option<f64>]) -> EvolutionLine {
        EvolutionLine {
            excel_row: 0,
            row_no: (!row_no.is_empty()).then(|| row_no.to_string()),
            description: description.to_string(),
            amounts: amounts.to_vec(),
        }
    }

    fn metric(
        subcontractor: &'static str,
        metric: CanonicalMetric,
        points: Vec<TimeSeriesPoint>,
    ) -> SubcontractorMetric {
        SubcontractorMetric {
            subcontractor,
            metric: MetricName::Canonical(metric),
            raw_label: metric.as_str().to_string(),
            excel_row: 10,
            points,
        }
    }

    // -------------------------------------------------------------------------
    // CONTRACT VALUES
    // -------------------------------------------------------------------------

    #[test]
    fn test_contract_values_melt_with_own_category() {
        let lines = vec![
            line("", "Description", &[]),
            line("A", "LUMP SUM", &[Some(10.0), Some(11.0)]),
            line("1", "Engineering", &[None, Some(1.0)]),
            line("", "REVISED CONTRACT PRICE", &[Some(10.0), Some(12.0)]),
        ];
        let categories = cost_categories(&lines);
        let rows = contract_values(&lines, &categories);

        assert_eq!(rows.len(), 2 * AMENDMENTS.len());
        assert_eq!(rows[0].cost_category_id, 1);
        assert_eq!(rows[1].cost_category_id, 2);
        assert_eq!(rows[1].amount_usd, None);
        assert_eq!(rows[3].amendment_id, 2);
        assert_eq!(rows[3].amount_usd, Some(1.0));
        assert_eq!(rows.last().map(|r| r.id), Some(12));
    }

    // -------------------------------------------------------------------------
    // MONTHLY COST
    // -------------------------------------------------------------------------

    #[test]
    fn test_fgrs_running_total_in_date_order() {
        let rows = monthly_costs(&[p(2021, 2, 3.0), p(2021, 1, 2.0), p(2020, 12, 1.0)], &[]);
        let totals: Vec<(u32, f64, Option<f64>)> = rows
            .iter()
            .map(|r| (r.month, r.monthly_amount_musd, r.cumulative_amount_musd))
            .collect();
        assert_eq!(totals, vec![(12, 1.0, Some(1.0)), (1, 2.0, Some(3.0)), (2, 3.0, Some(6.0))]);
        assert!(rows.iter().all(|r| r.cost_type == FGRS_COST_TYPE));
    }

    #[test]
    fn test_cumulative_logi_is_differenced() {
        let rows = monthly_costs(&[], &[p(2020, 1, 5.0), p(2020, 2, 7.0), p(2020, 3, 7.0)]);
        let amounts: Vec<f64> = rows.iter().map(|r| r.monthly_amount_musd).collect();
        assert_eq!(amounts, vec![5.0, 2.0, 0.0]);
        assert_eq!(rows[1].cumulative_amount_musd, Some(7.0));
    }

    #[test]
    fn test_non_monotonic_logi_is_monthly() {
        let rows = monthly_costs(&[p(2020, 1, 1.0)], &[p(2020, 1, 5.0), p(2020, 2, 3.0)]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].monthly_amount_musd, 5.0);
        assert_eq!(rows[2].cumulative_amount_musd, None);
        assert_eq!(rows[2].id, 3);
    }

    // -------------------------------------------------------------------------
    // POB
    // -------------------------------------------------------------------------

    #[test]
    fn test_pob_left_join_fills_zero() {
        let rows = monthly_pob(
            &[p(2020, 1, 6300.4), p(2020, 2, 6100.0)],
            &[p(2020, 2, 25.0), p(2020, 3, 9.0)],
        );
        assert_eq!(
            rows.iter().map(|r| (r.pob_count, r.isolation_count)).collect::<Vec<_>>(),
            vec![(6300, 0), (6100, 25)]
        );
    }

    // -------------------------------------------------------------------------
    // PAMF
    // -------------------------------------------------------------------------

    #[test]
    fn test_pamf_claims_join_discipline() {
        let record = |discipline: &str, label: &str, level: i32| HierarchyRecord {
            discipline: Some(discipline.to_string()),
            category: None,
            subcategory: None,
            label: label.to_string(),
            level,
            count: Some(3.0),
            amount: Some(10.5),
            excel_row: 1,
        };
        let ids: HashMap<&str, i64> = [("COVID", 1)].into_iter().collect();
        let rows = pamf_claims(
            &[
                record("COVID", "COVID", 0),
                record("COVID", "Deep", 3),
                record("TOTAL", "Grand Total", -1),
                record("Camp", "Camp", 0),
            ],
            &ids,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].discipline_id, Some(1));
        assert_eq!(rows[0].pamf_group, "COVID");
        assert_eq!(rows[0].pamf_count, Some(3));
        assert_eq!(rows[1].discipline_id, None);
        assert_eq!(rows[1].pamf_group, "OTHER");
        assert_eq!(rows[1].id, 2);
    }

    // -------------------------------------------------------------------------
    // VARIATION ORDERS
    // -------------------------------------------------------------------------

    #[test]
    fn test_variation_order_detection() {
        assert!(is_variation_order("Variation Orders 1-9"));
        assert!(is_variation_order("Approved VO-12"));
        assert!(is_variation_order("VOs approved"));
        assert!(is_variation_order("vo12 logistics"));
        assert!(!is_variation_order("Invoice adjustment"));
        assert!(!is_variation_order("VOWD reconciliation"));
    }

    #[test]
    fn test_variation_orders_one_per_amount() {
        let rows = variation_orders(&[
            line("5", "Variation Orders", &[None, Some(2.0), Some(3.0)]),
            line("6", "Engineering", &[Some(1.0)]),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].approved_in_amendment, 2);
        assert_eq!(rows[1].vo_number, "5");
        assert_eq!(rows[1].vo_id, 2);
    }

    // -------------------------------------------------------------------------
    // SUBCONTRACTORS
    // -------------------------------------------------------------------------

    #[test]
    fn test_subcontractor_monthly_long_format() {
        let mut unknown = metric("Daewoo", CanonicalMetric::InvoiceValue, vec![p(2020, 5, 1.0)]);
        unknown.metric = MetricName::Unknown { row: 80 };
        let rows = subcontractor_monthly(&[
            metric("Meindo", CanonicalMetric::AchievedManhours, vec![p(2020, 1, 10.0), p(2020, 2, 20.0)]),
            unknown,
        ]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].subcontractor_id, Some(1));
        assert_eq!(rows[0].metric, "achieved_manhours");
        assert_eq!(rows[2].metric, "unknown_80");
        assert_eq!(rows[2].subcontractor_id, Some(3));
    }

    #[test]
    fn test_project_progress_pivot() {
        let rows = project_progress(&[
            metric("Penta", CanonicalMetric::CumulativeProgressPlan, vec![p(2020, 1, 0.1), p(2020, 2, 0.2)]),
            metric("Meindo", CanonicalMetric::CumulativeProgressActual, vec![p(2020, 1, 0.05)]),
            metric("Penta", CanonicalMetric::CumulativeProgressActual, vec![p(2020, 2, 0.15)]),
            metric("Penta", CanonicalMetric::CumulativeProgressPlan, vec![p(2020, 2, 0.9)]),
            metric("Penta", CanonicalMetric::InvoiceValue, vec![p(2020, 3, 5.0)]),
        ]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].subcontractor, "Meindo");
        assert_eq!(rows[0].overall_progress_pct, Some(0.05));
        assert_eq!(rows[0].plan_progress_pct, None);
        assert_eq!(rows[2].subcontractor, "Penta");
        assert_eq!(rows[2].month, 2);
        assert_eq!(rows[2].plan_progress_pct, Some(0.2));
        assert_eq!(rows[2].overall_progress_pct, Some(0.15));
        assert_eq!(rows[2].id, 3);
    }
}
