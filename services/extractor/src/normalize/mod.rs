//! Extraction → relational tables.
//!
//! Reference tables are built first because the fact tables join against
//! them: contract values need the category of each evolution line, claims
//! need discipline ids. Surrogate ids are 1-based and assigned in output
//! order.

pub mod facts;
pub mod raw;
pub mod reference_tables;

use crate::sources::Extraction;
use crate::tables::{Table, TableSet};
use tracing::info;

/// The thirteen output tables plus the raw extraction tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub tables: TableSet,
    pub raw: TableSet,
}

pub fn normalize(extraction: &Extraction) -> Normalized {
    let evolution = &extraction.evolution;
    let timeline = &extraction.timeline;

    let amendments = reference_tables::amendments(evolution);
    let categories = reference_tables::cost_categories(evolution);
    let disciplines = reference_tables::disciplines(&extraction.claims);
    let discipline_ids = reference_tables::discipline_ids(&disciplines);

    let mut tables = TableSet::new();
    tables.insert(reference_tables::project_table());
    tables.insert(Table::from_records("tb_m_amendment", &amendments));
    tables.insert(Table::from_records("tb_m_cost_category", &categories.categories));
    tables.insert(Table::from_records("tb_m_cost_discipline", &disciplines));
    tables.insert(reference_tables::subcontractor_table());
    tables.insert(reference_tables::event_table());

    tables.insert(Table::from_records(
        "tb_t_contract_value",
        &facts::contract_values(evolution, &categories),
    ));
    tables.insert(Table::from_records(
        "tb_t_monthly_cost",
        &facts::monthly_costs(&timeline.fgrs.points, &timeline.logi.points),
    ));
    tables.insert(Table::from_records(
        "tb_t_monthly_pob",
        &facts::monthly_pob(&timeline.pob.points, &timeline.isolation.points),
    ));
    tables.insert(Table::from_records(
        "tb_t_pamf_claim",
        &facts::pamf_claims(&extraction.claims, &discipline_ids),
    ));
    tables.insert(Table::from_records(
        "tb_t_variation_order",
        &facts::variation_orders(evolution),
    ));
    tables.insert(Table::from_records(
        "tb_t_subcontractor_monthly",
        &facts::subcontractor_monthly(&timeline.subcontractors),
    ));
    tables.insert(Table::from_records(
        "tb_t_project_progress",
        &facts::project_progress(&timeline.subcontractors),
    ));

    let amount_columns = evolution.iter().map(|l| l.amounts.len()).max().unwrap_or(0);
    let mut raw = TableSet::new();
    raw.insert(raw::contract_evolution(evolution, amount_columns));
    raw.insert(raw::pamf_claims(&extraction.claims));
    raw.insert(raw::fgrs_monthly(&timeline.fgrs));
    raw.insert(raw::logi_monthly(&timeline.logi));
    raw.insert(raw::pob_monthly(&timeline.pob, &timeline.isolation));
    raw.insert(raw::subcontractor_monthly(&timeline.subcontractors));

    for table in tables.iter() {
        info!(table = %table.name, rows = table.len(), "normalized table");
    }

    Normalized { tables, raw }
}
