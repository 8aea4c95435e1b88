//! Static reference data that is not present in any of the workbooks.

use chrono::NaiveDate;

/// `(year, month, day)`.
pub type Ymd = (i32, u32, u32);

pub const PROJECT_ID: i64 = 1;

pub fn date(ymd: Ymd) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2)
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub client: &'static str,
    pub country: &'static str,
    pub contract_type: &'static str,
    pub original_contract_value: i64,
    pub start_date: Ymd,
    pub planned_end_date: Ymd,
    pub status: &'static str,
}

pub const PROJECT: ProjectInfo = ProjectInfo {
    code: "TEP",
    name: "Tangguh Expansion Project",
    client: "BP Berau Ltd",
    country: "Indonesia",
    contract_type: "EPCI",
    original_contract_value: 2_432_775_726,
    start_date: (2016, 6, 1),
    planned_end_date: (2023, 12, 31),
    status: "In Progress",
};

/// Amendment metadata, in column order of the evolution workbook
/// (original contract first).
#[derive(Debug, Clone, Copy)]
pub struct AmendmentInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub effective_date: Ymd,
    pub remarks: &'static str,
}

pub const AMENDMENTS: [AmendmentInfo; 6] = [
    AmendmentInfo {
        code: "ORIGINAL",
        name: "Original Contract",
        effective_date: (2016, 6, 1),
        remarks: "Original EPCI Contract Award",
    },
    AmendmentInfo {
        code: "AMD-1",
        name: "Amendment 1",
        effective_date: (2017, 1, 1),
        remarks: "Novated contract adjustment",
    },
    AmendmentInfo {
        code: "AMD-2",
        name: "Amendment 2",
        effective_date: (2019, 5, 1),
        remarks: "Scope restructure: VOs 1-9, logistics RCE",
    },
    AmendmentInfo {
        code: "AMD-3",
        name: "Amendment 3",
        effective_date: (2020, 12, 1),
        remarks: "COVID-19 response, FGRS RCE",
    },
    AmendmentInfo {
        code: "AMD-4",
        name: "Amendment 4",
        effective_date: (2022, 6, 1),
        remarks: "COVID FM costs, expanded reimbursable",
    },
    AmendmentInfo {
        code: "AMD-5",
        name: "Amendment 5",
        effective_date: (2024, 1, 1),
        remarks: "Final: COVID Tier 4, PP35, commissioning",
    },
];

/// Amendment ids are 1-based positions in [`AMENDMENTS`].
pub fn amendment_id(index: usize) -> i64 {
    index as i64 + 1
}

#[derive(Debug, Clone, Copy)]
pub struct SubcontractorInfo {
    pub id: i64,
    pub name: &'static str,
    /// Label keywords marking the subcontractor's block in the timeline
    /// sheet.
    pub keywords: &'static [&'static str],
    pub contract_number: &'static str,
    pub scope_of_work: &'static str,
}

pub const SUBCONTRACTORS: [SubcontractorInfo; 3] = [
    SubcontractorInfo {
        id: 1,
        name: "Meindo",
        keywords: &["MEINDO"],
        contract_number: "",
        scope_of_work: "Piping Erection",
    },
    SubcontractorInfo {
        id: 2,
        name: "Penta",
        keywords: &["PENTA"],
        contract_number: "",
        scope_of_work: "Piping Erection",
    },
    SubcontractorInfo {
        id: 3,
        name: "Daewoo",
        keywords: &["DAEWOO"],
        contract_number: "1306754",
        scope_of_work: "General Construction / Piping Erection",
    },
];

pub fn subcontractor_id(name: &str) -> Option<i64> {
    SUBCONTRACTORS
        .iter()
        .find(|s| s.name == name)
        .map(|s| s.id)
}

#[derive(Debug, Clone, Copy)]
pub struct EventInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub event_type: &'static str,
    pub start_date: Ymd,
    pub end_date: Option<Ymd>,
    pub description: &'static str,
}

pub const EVENTS: [EventInfo; 10] = [
    EventInfo {
        code: "CONTRACT_AWARD",
        name: "Contract Award",
        event_type: "MILESTONE",
        start_date: (2016, 6, 1),
        end_date: None,
        description: "Original EPCI Contract signed",
    },
    EventInfo {
        code: "AMD_1",
        name: "Amendment 1",
        event_type: "AMENDMENT",
        start_date: (2017, 1, 1),
        end_date: None,
        description: "Novated contract adjustment (GE contract)",
    },
    EventInfo {
        code: "AMD_2",
        name: "Amendment 2",
        event_type: "AMENDMENT",
        start_date: (2019, 5, 1),
        end_date: None,
        description: "Major scope restructure: reimbursable, VOs, logistics",
    },
    EventInfo {
        code: "COVID_PANDEMIC",
        name: "COVID-19 Pandemic Onset",
        event_type: "PANDEMIC",
        start_date: (2020, 3, 1),
        end_date: None,
        description: "COVID-19 begins affecting project, POB restricted 12000+ to ~6300",
    },
    EventInfo {
        code: "FM",
        name: "Force Majeure Declaration",
        event_type: "FORCE_MAJEURE",
        start_date: (2020, 12, 1),
        end_date: None,
        description: "Force Majeure declared due to COVID-19 impact",
    },
    EventInfo {
        code: "AMD_3",
        name: "Amendment 3",
        event_type: "AMENDMENT",
        start_date: (2020, 12, 1),
        end_date: None,
        description: "COVID response, FGRS RCE, additional provisional sums",
    },
    EventInfo {
        code: "OUTBREAK_2",
        name: "2nd COVID Outbreak (Delta)",
        event_type: "OUTBREAK",
        start_date: (2021, 7, 1),
        end_date: Some((2021, 12, 31)),
        description: "Second COVID outbreak at Tangguh site (Delta variant)",
    },
    EventInfo {
        code: "AMD_4",
        name: "Amendment 4",
        event_type: "AMENDMENT",
        start_date: (2022, 6, 1),
        end_date: None,
        description: "Extended COVID FM costs, expanded reimbursable",
    },
    EventInfo {
        code: "OUTBREAK_3",
        name: "3rd COVID Outbreak (Omicron)",
        event_type: "OUTBREAK",
        start_date: (2022, 1, 1),
        end_date: Some((2022, 6, 30)),
        description: "Third COVID outbreak (Omicron variant)",
    },
    EventInfo {
        code: "AMD_5",
        name: "Amendment 5",
        event_type: "AMENDMENT",
        start_date: (2024, 1, 1),
        end_date: None,
        description: "Final amendment: COVID Tier 4, labor law PP35, commissioning",
    },
];

/// Group of a PAMF discipline, by keyword in its name.
pub fn discipline_group(name: &str) -> &'static str {
    let name = name.to_uppercase();
    ["COVID", "LOGISTIC", "PMT", "SMT"]
        .into_iter()
        .find(|group| name.contains(*group))
        .unwrap_or("OTHER")
}

/// Group given to level-1 PAMF labels promoted to disciplines.
pub const SUB_DISCIPLINE_GROUP: &str = "SUB";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_dates_are_valid() {
        assert!(date(PROJECT.start_date).is_some());
        assert!(date(PROJECT.planned_end_date).is_some());
        for amendment in &AMENDMENTS {
            assert!(date(amendment.effective_date).is_some(), "{}", amendment.code);
        }
        for event in &EVENTS {
            assert!(date(event.start_date).is_some(), "{}", event.code);
            if let Some(end) = event.end_date {
                assert!(date(end) >= date(event.start_date), "{}", event.code);
            }
        }
    }

    #[test]
    fn test_discipline_group() {
        assert_eq!(discipline_group("COVID-19 Cost"), "COVID");
        assert_eq!(discipline_group("Logistics"), "LOGISTIC");
        assert_eq!(discipline_group("pmt support"), "PMT");
        assert_eq!(discipline_group("SMT"), "SMT");
        assert_eq!(discipline_group("Camp"), "OTHER");
    }

    #[test]
    fn test_subcontractor_ids() {
        assert_eq!(subcontractor_id("Penta"), Some(2));
        assert_eq!(subcontractor_id("Unknown"), None);
        assert_eq!(amendment_id(0), 1);
    }
}
