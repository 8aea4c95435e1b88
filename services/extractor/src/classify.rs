//! Free-text metric labels → canonical metric names.

use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalMetric {
    AchievedManhours,
    InvoiceValue,
    ActualVowd,
    PobPlan,
    PobActual,
    CumulativeProgressPlan,
    CumulativeProgressActual,
    MonthlyProgressPlan,
    MonthlyProgressActual,
}

impl CanonicalMetric {
    pub const ALL: [CanonicalMetric; 9] = [
        CanonicalMetric::AchievedManhours,
        CanonicalMetric::InvoiceValue,
        CanonicalMetric::ActualVowd,
        CanonicalMetric::PobPlan,
        CanonicalMetric::PobActual,
        CanonicalMetric::CumulativeProgressPlan,
        CanonicalMetric::CumulativeProgressActual,
        CanonicalMetric::MonthlyProgressPlan,
        CanonicalMetric::MonthlyProgressActual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalMetric::AchievedManhours => "achieved_manhours",
            CanonicalMetric::InvoiceValue => "invoice_value",
            CanonicalMetric::ActualVowd => "actual_vowd",
            CanonicalMetric::PobPlan => "pob_plan",
            CanonicalMetric::PobActual => "pob_actual",
            CanonicalMetric::CumulativeProgressPlan => "cumulative_progress_plan",
            CanonicalMetric::CumulativeProgressActual => "cumulative_progress_actual",
            CanonicalMetric::MonthlyProgressPlan => "monthly_progress_plan",
            CanonicalMetric::MonthlyProgressActual => "monthly_progress_actual",
        }
    }

    pub fn is_progress(&self) -> bool {
        matches!(
            self,
            CanonicalMetric::CumulativeProgressPlan
                | CanonicalMetric::CumulativeProgressActual
                | CanonicalMetric::MonthlyProgressPlan
                | CanonicalMetric::MonthlyProgressActual
        )
    }
}

impl fmt::Display for CanonicalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified label. Unmatched labels keep their sheet row so two unknown
/// rows never collapse into one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricName {
    Canonical(CanonicalMetric),
    Unknown { row: usize },
}

impl MetricName {
    pub fn canonical(&self) -> Option<CanonicalMetric> {
        match self {
            MetricName::Canonical(metric) => Some(*metric),
            MetricName::Unknown { .. } => None,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricName::Canonical(metric) => f.write_str(metric.as_str()),
            MetricName::Unknown { row } => write!(f, "unknown_{}", row),
        }
    }
}

impl Serialize for MetricName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Lower-case keyword table. Plan variants are listed before the generic
/// keyword of the same length so the stable sort keeps them ahead.
pub const METRIC_KEYWORDS: &[(&str, CanonicalMetric)] = &[
    ("mhr", CanonicalMetric::AchievedManhours),
    ("manhour", CanonicalMetric::AchievedManhours),
    ("man hour", CanonicalMetric::AchievedManhours),
    ("invoice", CanonicalMetric::InvoiceValue),
    ("inv ", CanonicalMetric::InvoiceValue),
    ("vowd", CanonicalMetric::ActualVowd),
    ("vow", CanonicalMetric::ActualVowd),
    ("plan pob", CanonicalMetric::PobPlan),
    ("pob plan", CanonicalMetric::PobPlan),
    ("plan manpower", CanonicalMetric::PobPlan),
    ("pob", CanonicalMetric::PobActual),
    ("manpower", CanonicalMetric::PobActual),
    ("plan cumulative", CanonicalMetric::CumulativeProgressPlan),
    ("cumulative plan", CanonicalMetric::CumulativeProgressPlan),
    ("plan cumul", CanonicalMetric::CumulativeProgressPlan),
    ("plan cum", CanonicalMetric::CumulativeProgressPlan),
    ("cum plan", CanonicalMetric::CumulativeProgressPlan),
    ("cumulative", CanonicalMetric::CumulativeProgressActual),
    ("cum", CanonicalMetric::CumulativeProgressActual),
    ("plan monthly prog", CanonicalMetric::MonthlyProgressPlan),
    ("monthly progress plan", CanonicalMetric::MonthlyProgressPlan),
    ("plan month", CanonicalMetric::MonthlyProgressPlan),
    ("monthly prog", CanonicalMetric::MonthlyProgressActual),
    ("month prog", CanonicalMetric::MonthlyProgressActual),
];

/// Longest-keyword-first substring matcher.
#[derive(Debug, Clone)]
pub struct MetricClassifier {
    keywords: Vec<(&'static str, CanonicalMetric)>,
}

impl Default for MetricClassifier {
    fn default() -> Self {
        Self::new(METRIC_KEYWORDS)
    }
}

impl MetricClassifier {
    pub fn new(table: &[(&'static str, CanonicalMetric)]) -> Self {
        let mut keywords = table.to_vec();
        keywords.sort_by_key(|(keyword, _)| Reverse(keyword.len()));
        Self { keywords }
    }

    /// `row` is the 1-based sheet row the label came from.
    pub fn classify(&self, label: &str, row: usize) -> MetricName {
        let label = label.to_lowercase();
        self.keywords
            .iter()
            .find(|(keyword, _)| label.contains(keyword))
            .map(|(_, metric)| MetricName::Canonical(*metric))
            .unwrap_or(MetricName::Unknown { row })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(label: &str) -> MetricName {
        MetricClassifier::default().classify(label, 1)
    }

    fn canonical(metric: CanonicalMetric) -> MetricName {
        MetricName::Canonical(metric)
    }

    #[test]
    fn test_common_labels() {
        assert_eq!(classify("Achieved Manhours"), canonical(CanonicalMetric::AchievedManhours));
        assert_eq!(classify("MHR (k)"), canonical(CanonicalMetric::AchievedManhours));
        assert_eq!(classify("Invoice Value (MUSD)"), canonical(CanonicalMetric::InvoiceValue));
        assert_eq!(classify("Actual VOWD MUSD"), canonical(CanonicalMetric::ActualVowd));
        assert_eq!(classify("POB Actual"), canonical(CanonicalMetric::PobActual));
        assert_eq!(classify("Plan POB"), canonical(CanonicalMetric::PobPlan));
        assert_eq!(classify("Monthly Progress"), canonical(CanonicalMetric::MonthlyProgressActual));
        assert_eq!(classify("Plan Monthly Progress"), canonical(CanonicalMetric::MonthlyProgressPlan));
    }

    #[test]
    fn test_plan_cumulative_beats_cumulative() {
        for label in ["Plan Cum %", "PLAN CUMULATIVE PROGRESS", "plan cumul.", "Cumulative Plan"] {
            assert_eq!(
                classify(label),
                canonical(CanonicalMetric::CumulativeProgressPlan),
                "label {}",
                label
            );
        }
        assert_eq!(classify("Actual Cum %"), canonical(CanonicalMetric::CumulativeProgressActual));
    }

    #[test]
    fn test_every_plan_cum_label_resolves_to_plan() {
        let classifier = MetricClassifier::default();
        for prefix in ["", "Meindo ", "  ", "Overall "] {
            for suffix in ["", " %", "ulative", " progress", " (weighted)"] {
                let label = format!("{}Plan Cum{}", prefix, suffix);
                assert_eq!(
                    classifier.classify(&label, 9).canonical(),
                    Some(CanonicalMetric::CumulativeProgressPlan),
                    "label {}",
                    label
                );
            }
        }
    }

    #[test]
    fn test_unknown_keeps_row() {
        let classifier = MetricClassifier::default();
        let a = classifier.classify("Remarks", 71);
        let b = classifier.classify("Remarks", 72);

        assert_eq!(a, MetricName::Unknown { row: 71 });
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "unknown_71");
        assert_eq!(a.canonical(), None);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = MetricClassifier::default();
        for label in ["Invoice", "Cum Plan", "xyz", "Manpower Plan"] {
            assert_eq!(classifier.classify(label, 4), classifier.classify(label, 4));
        }
    }

    #[test]
    fn test_equal_length_keywords_keep_table_order() {
        let classifier = MetricClassifier::new(&[
            ("abcd", CanonicalMetric::InvoiceValue),
            ("bcde", CanonicalMetric::ActualVowd),
        ]);
        assert_eq!(
            classifier.classify("abcde", 1),
            canonical(CanonicalMetric::InvoiceValue)
        );
    }

    #[test]
    fn test_display_names() {
        assert_eq!(canonical(CanonicalMetric::PobPlan).to_string(), "pob_plan");
        assert_eq!(
            CanonicalMetric::ALL.iter().filter(|m| m.is_progress()).count(),
            4
        );
    }
}
