use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::asset::AssetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Note => "NOTE",
        }
    }

    /// Notes document intent; errors and warnings flag defects.
    #[must_use]
    pub const fn is_defect(self) -> bool {
        !matches!(self, Self::Note)
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    #[must_use]
    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Severity::Note, message)
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Per-asset issue lists in discovery order. Only assets with at least one
/// issue appear as keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueReport {
    issues: BTreeMap<AssetId, Vec<Issue>>,
}

impl IssueReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to any issues already recorded for the asset; empty lists
    /// are dropped so key presence means "has issues".
    pub fn attach(&mut self, id: &AssetId, issues: Vec<Issue>) {
        if issues.is_empty() {
            return;
        }
        self.issues.entry(id.clone()).or_default().extend(issues);
    }

    #[must_use]
    pub fn for_asset(&self, id: &AssetId) -> &[Issue] {
        self.issues.get(id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn has_issues(&self, id: &AssetId) -> bool {
        self.issues.contains_key(id)
    }

    /// True when the asset carries anything beyond notes.
    #[must_use]
    pub fn has_defect(&self, id: &AssetId) -> bool {
        self.for_asset(id).iter().any(|i| i.severity.is_defect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &[Issue])> {
        self.issues.iter().map(|(id, list)| (id, list.as_slice()))
    }

    #[must_use]
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for issues in self.issues.values() {
            for issue in issues {
                *counts.entry(issue.severity).or_insert(0) += 1;
            }
        }
        counts
    }

    #[must_use]
    pub fn worst(&self) -> Option<Severity> {
        self.issues
            .values()
            .flatten()
            .map(|i| i.severity)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> AssetId {
        AssetId::parse(raw).expect("id")
    }

    #[test]
    fn attach_drops_empty_and_appends() {
        let mut report = IssueReport::new();
        report.attach(&id("a_1"), Vec::new());
        assert!(report.is_empty());

        report.attach(&id("a_1"), vec![Issue::warning("first")]);
        report.attach(&id("a_1"), vec![Issue::note("second")]);
        assert_eq!(report.for_asset(&id("a_1")).len(), 2);
        assert_eq!(report.for_asset(&id("a_1"))[0].message, "first");
    }

    #[test]
    fn defect_ignores_notes() {
        let mut report = IssueReport::new();
        report.attach(&id("a_1"), vec![Issue::note("fyi")]);
        assert!(report.has_issues(&id("a_1")));
        assert!(!report.has_defect(&id("a_1")));

        report.attach(&id("a_1"), vec![Issue::error("broken")]);
        assert!(report.has_defect(&id("a_1")));
        assert_eq!(report.worst(), Some(Severity::Error));
    }

    #[test]
    fn report_serializes_as_a_map_keyed_by_asset_id() {
        let mut report = IssueReport::new();
        report.attach(&id("srv_1"), vec![Issue::error("broken")]);
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["srv_1"][0]["severity"], "error");
        assert_eq!(json["srv_1"][0]["message"], "broken");
    }

    #[test]
    fn severity_counts_aggregate_across_assets() {
        let mut report = IssueReport::new();
        report.attach(&id("a_1"), vec![Issue::warning("w"), Issue::warning("w2")]);
        report.attach(&id("b_1"), vec![Issue::error("e")]);
        let counts = report.severity_counts();
        assert_eq!(counts.get(&Severity::Warning), Some(&2));
        assert_eq!(counts.get(&Severity::Error), Some(&1));
        assert_eq!(counts.get(&Severity::Note), None);
    }
}
