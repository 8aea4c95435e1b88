//! `tb_m_*` lookup tables.

use crate::hierarchy::{HierarchyRecord, TOTAL_DISCIPLINE};
use crate::reference::{
    self, amendment_id, discipline_group, AMENDMENTS, EVENTS, PROJECT, PROJECT_ID,
    SUBCONTRACTORS, SUB_DISCIPLINE_GROUP,
};
use crate::sources::EvolutionLine;
use crate::tables::{Record, Table, Value};
use std::collections::HashMap;

pub fn project_table() -> Table {
    let mut table = Table::new(
        "tb_m_project",
        &[
            "project_id",
            "project_code",
            "project_name",
            "client",
            "country",
            "contract_type",
            "original_contract_value",
            "start_date",
            "planned_end_date",
            "actual_end_date",
            "status",
        ],
    );
    table.push(vec![
        PROJECT_ID.into(),
        PROJECT.code.into(),
        PROJECT.name.into(),
        PROJECT.client.into(),
        PROJECT.country.into(),
        PROJECT.contract_type.into(),
        PROJECT.original_contract_value.into(),
        reference::date(PROJECT.start_date).into(),
        reference::date(PROJECT.planned_end_date).into(),
        Value::Null,
        PROJECT.status.into(),
    ]);
    table
}

// ----------------------------------------------------------------------------
// Amendments
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AmendmentRow {
    pub amendment_id: i64,
    pub amendment_code: &'static str,
    pub amendment_name: &'static str,
    pub effective_date: Option<chrono::NaiveDate>,
    pub total_contract_value: f64,
    pub lump_sum_value: f64,
    pub reimbursable_value: f64,
    pub provisional_sum_value: f64,
    pub backcharge_value: f64,
    pub remarks: &'static str,
}

impl Record for AmendmentRow {
    const COLUMNS: &'static [&'static str] = &[
        "amendment_id",
        "project_id",
        "amendment_code",
        "amendment_name",
        "effective_date",
        "total_contract_value",
        "lump_sum_value",
        "reimbursable_value",
        "provisional_sum_value",
        "backcharge_value",
        "remarks",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.amendment_id.into(),
            PROJECT_ID.into(),
            self.amendment_code.into(),
            self.amendment_name.into(),
            self.effective_date.into(),
            self.total_contract_value.into(),
            self.lump_sum_value.into(),
            self.reimbursable_value.into(),
            self.provisional_sum_value.into(),
            self.backcharge_value.into(),
            self.remarks.into(),
        ]
    }
}

/// Whether a line is the revised contract price total.
pub fn is_revised_total(line: &EvolutionLine) -> bool {
    line.description_contains("REVISED CONTRACT") || line.description_contains("CONTRACT PRICE")
}

/// Amendment totals come from the revised contract price line (or the last
/// line when there is none); category values from the first line naming the
/// category. Anything missing is 0.
pub fn amendments(lines: &[EvolutionLine]) -> Vec<AmendmentRow> {
    let total = lines.iter().find(|l| is_revised_total(l)).or(lines.last());
    let first_with = |needle: &str| lines.iter().find(|l| l.description_contains(needle));
    let lump_sum = first_with("LUMP SUM");
    let reimbursable = first_with("REIMBURSABLE");
    let provisional = first_with("PROVISIONAL SUM");
    let backcharge = first_with("BACKCHARGE");

    let amount = |line: Option<&EvolutionLine>, index: usize| {
        line.and_then(|l| l.amounts.get(index).copied().flatten())
            .unwrap_or(0.0)
    };

    AMENDMENTS
        .iter()
        .enumerate()
        .map(|(index, info)| AmendmentRow {
            amendment_id: amendment_id(index),
            amendment_code: info.code,
            amendment_name: info.name,
            effective_date: reference::date(info.effective_date),
            total_contract_value: amount(total, index),
            lump_sum_value: amount(lump_sum, index),
            reimbursable_value: amount(reimbursable, index),
            provisional_sum_value: amount(provisional, index),
            backcharge_value: amount(backcharge, index),
            remarks: info.remarks,
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Cost categories
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CostCategoryRow {
    pub category_id: i64,
    pub parent_category_id: Option<i64>,
    pub category_code: String,
    pub category_name: String,
    pub category_type: &'static str,
    pub level: i64,
}

impl Record for CostCategoryRow {
    const COLUMNS: &'static [&'static str] = &[
        "category_id",
        "parent_category_id",
        "category_code",
        "category_name",
        "category_type",
        "level",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.category_id.into(),
            self.parent_category_id.into(),
            self.category_code.clone().into(),
            self.category_name.clone().into(),
            self.category_type.into(),
            self.level.into(),
        ]
    }
}

/// Categories plus, for each evolution line, the category it belongs to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryIndex {
    pub categories: Vec<CostCategoryRow>,
    /// Aligned with the evolution lines. `None` for lines before the first
    /// section and for revised-total lines.
    pub line_category: Vec<Option<i64>>,
}

fn section_type(row_no: &str) -> Option<&'static str> {
    match row_no {
        "A" => Some("LUMP_SUM"),
        "B" => Some("REIMBURSABLE"),
        "C" => Some("PROVISIONAL"),
        "D" => Some("BACKCHARGE"),
        _ => None,
    }
}

/// Sections A..D open level-1 categories; other numbered lines inside a
/// section become its level-2 children. Unnumbered lines belong to the
/// enclosing section.
pub fn cost_categories(lines: &[EvolutionLine]) -> CategoryIndex {
    let mut index = CategoryIndex::default();
    let mut section: Option<(i64, &'static str)> = None;

    for line in lines {
        if is_revised_total(line) {
            index.line_category.push(None);
            continue;
        }

        let row_no = line.row_no().trim();
        let category_id = index.categories.len() as i64 + 1;
        if let Some(category_type) = section_type(row_no) {
            section = Some((category_id, category_type));
            index.categories.push(CostCategoryRow {
                category_id,
                parent_category_id: None,
                category_code: row_no.to_string(),
                category_name: line.description.clone(),
                category_type,
                level: 1,
            });
            index.line_category.push(Some(category_id));
        } else if let Some((parent_id, category_type)) = section.filter(|_| !row_no.is_empty()) {
            index.categories.push(CostCategoryRow {
                category_id,
                parent_category_id: Some(parent_id),
                category_code: row_no.to_string(),
                category_name: line.description.clone(),
                category_type,
                level: 2,
            });
            index.line_category.push(Some(category_id));
        } else {
            index.line_category.push(section.map(|(id, _)| id));
        }
    }

    index
}

// ----------------------------------------------------------------------------
// Disciplines
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DisciplineRow {
    pub discipline_id: i64,
    pub discipline_code: String,
    pub discipline_name: String,
    pub discipline_group: &'static str,
}

impl Record for DisciplineRow {
    const COLUMNS: &'static [&'static str] = &[
        "discipline_id",
        "discipline_code",
        "discipline_name",
        "discipline_group",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.discipline_id.into(),
            self.discipline_code.clone().into(),
            self.discipline_name.clone().into(),
            self.discipline_group.into(),
        ]
    }
}

/// Level-0 claim labels, then level-1 labels not already present.
pub fn disciplines(claims: &[HierarchyRecord]) -> Vec<DisciplineRow> {
    let mut rows: Vec<DisciplineRow> = Vec::new();
    let mut push = |name: &str, group: &'static str| {
        if name == TOTAL_DISCIPLINE || rows.iter().any(|r| r.discipline_name == name) {
            return;
        }
        let id = rows.len() as i64 + 1;
        rows.push(DisciplineRow {
            discipline_id: id,
            discipline_code: format!("{:02}", id),
            discipline_name: name.to_string(),
            discipline_group: group,
        });
    };

    for claim in claims.iter().filter(|c| c.level == 0) {
        push(&claim.label, discipline_group(&claim.label));
    }
    for claim in claims.iter().filter(|c| c.level == 1) {
        push(&claim.label, SUB_DISCIPLINE_GROUP);
    }
    rows
}

pub fn discipline_ids(rows: &[DisciplineRow]) -> HashMap<&str, i64> {
    rows.iter()
        .map(|r| (r.discipline_name.as_str(), r.discipline_id))
        .collect()
}

// ----------------------------------------------------------------------------
// Subcontractors and events
// ----------------------------------------------------------------------------

pub fn subcontractor_table() -> Table {
    let mut table = Table::new(
        "tb_m_subcontractor",
        &[
            "subcontractor_id",
            "project_id",
            "subcontractor_name",
            "contract_number",
            "scope_of_work",
            "contract_value",
            "start_date",
            "end_date",
        ],
    );
    for info in &SUBCONTRACTORS {
        table.push(vec![
            info.id.into(),
            PROJECT_ID.into(),
            info.name.into(),
            info.contract_number.into(),
            info.scope_of_work.into(),
            Value::Null,
            Value::Null,
            Value::Null,
        ]);
    }
    table
}

pub fn event_table() -> Table {
    let mut table = Table::new(
        "tb_m_event",
        &[
            "event_id",
            "project_id",
            "event_code",
            "event_name",
            "event_type",
            "start_date",
            "end_date",
            "description",
        ],
    );
    for (index, event) in EVENTS.iter().enumerate() {
        table.push(vec![
            (index + 1).into(),
            PROJECT_ID.into(),
            event.code.into(),
            event.name.into(),
            event.event_type.into(),
            reference::date(event.start_date).into(),
            event.end_date.and_then(reference::date).into(),
            event.description.into(),
        ]);
    }
    table
}
