use crate::RenderError;
use inframap_model::{IssueReport, Severity};

/// One-line counts plus per-asset findings, sorted by asset id.
#[must_use]
pub fn render_text_summary(report: &IssueReport) -> String {
    let counts = report.severity_counts();
    let count = |s: Severity| counts.get(&s).copied().unwrap_or(0);
    let mut lines = vec![format!(
        "summary: errors={} warnings={} notes={} assets_with_issues={}",
        count(Severity::Error),
        count(Severity::Warning),
        count(Severity::Note),
        report.asset_count(),
    )];
    for (id, issues) in report.iter() {
        for issue in issues {
            lines.push(format!("{id}: {issue}"));
        }
    }
    lines.join("\n")
}

pub fn render_json(report: &IssueReport) -> Result<String, RenderError> {
    serde_json::to_string_pretty(report).map_err(|err| RenderError::Serialize {
        detail: err.to_string(),
    })
}

/// One JSON object per line, one line per asset with issues.
pub fn render_jsonl(report: &IssueReport) -> Result<String, RenderError> {
    let mut lines = Vec::new();
    for (id, issues) in report.iter() {
        let row = serde_json::json!({ "id": id, "issues": issues });
        lines.push(
            serde_json::to_string(&row).map_err(|err| RenderError::Serialize {
                detail: err.to_string(),
            })?,
        );
    }
    Ok(lines.join("\n"))
}
