use crate::theme::Theme;
use inframap_model::{Asset, IssueReport, TypeRegistry};
use std::collections::BTreeMap;

/// Graphviz dot text for a subset plus its placeholder nodes.
///
/// Node ids are `n0..nN` in input order, subset first, placeholders after,
/// so successive renders of the same subset are byte-identical. Edges point
/// from dependency to dependent. Exclusion entries never become edges.
#[must_use]
pub fn render_dot(
    subset: &[&Asset],
    placeholders: &[Asset],
    report: &IssueReport,
    registry: &TypeRegistry,
    theme: &Theme,
    title: &str,
) -> String {
    let mut node_ids: BTreeMap<&str, String> = BTreeMap::new();
    for (i, asset) in subset.iter().enumerate() {
        node_ids.insert(asset.id.as_str(), format!("n{i}"));
    }
    for (i, asset) in placeholders.iter().enumerate() {
        node_ids.insert(asset.id.as_str(), format!("n{}", subset.len() + i));
    }

    let mut lines = theme.header_lines(title);

    for asset in placeholders {
        let node = &node_ids[asset.id.as_str()];
        lines.push(format!(
            "  {node} [label=\"???\", shape=doubleoctagon, \
             fillcolor=\"{}\", style=filled, tooltip=\"{}\"]",
            theme.error_fill,
            escape(asset.id.as_str()),
        ));
    }

    for asset in subset {
        let node = &node_ids[asset.id.as_str()];
        let mut attrs: Vec<String> = Vec::new();

        let label = if asset.name.is_empty() {
            asset.id.as_str()
        } else {
            asset.name.as_str()
        };
        attrs.push(format!("label=\"{}\"", escape(&split_wide_name(label))));
        if let Some(spec) = registry.get(&asset.asset_type) {
            if !spec.style.is_empty() {
                attrs.push(spec.style.clone());
            }
        }
        if report.has_defect(&asset.id) {
            attrs.push("style=filled".to_string());
            attrs.push(format!("fillcolor=\"{}\"", theme.error_fill));
        }
        attrs.push(format!("tooltip=\"{}\"", escape(&tooltip(asset, report))));

        lines.push(format!("  {node} [{}]", attrs.join(", ")));

        for expr in &asset.depends_on {
            if expr.is_excluded() {
                continue;
            }
            if let Some(dep_node) = node_ids.get(expr.target()) {
                lines.push(format!(
                    "  {dep_node} -> {node} [fontcolor=\"{}\"]",
                    theme.edit_color
                ));
            }
        }
    }

    lines.push("}".to_string());
    lines.join("\n")
}

/// Hover text: validation findings first, then scalar fields, list fields,
/// and the defining file. Lines are joined with a literal `\n` escape when
/// the tooltip attribute is emitted.
fn tooltip(asset: &Asset, report: &IssueReport) -> String {
    let mut lines: Vec<String> = report
        .for_asset(&asset.id)
        .iter()
        .map(|i| format!("{} {}", i.severity, i.message))
        .collect();
    for (key, value) in asset.scalar_fields() {
        lines.push(format!("{key}: {value}"));
    }
    for (key, items) in asset.list_fields() {
        lines.push(key.to_uppercase());
        for item in items {
            lines.push(format!("  {item}"));
        }
    }
    if let Some(source) = &asset.source {
        lines.push(format!("Defined in {}", source.display()));
    }
    lines.join("\n")
}

/// Names wider than 16 characters get a line break near the midpoint, at
/// the closest space, underscore, or hyphen. Names with no break character
/// near the midpoint stay on one line.
fn split_wide_name(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let half = chars.len() / 2;
    if half <= 8 {
        return text.to_string();
    }
    let breakable = |c: char| c == ' ' || c == '_' || c == '-';
    let mut at = None;
    for i in 0..half.saturating_sub(1) {
        if half + i < chars.len() && breakable(chars[half + i]) {
            at = Some(half + i);
            break;
        }
        if breakable(chars[half - i]) {
            at = Some(half - i);
            break;
        }
    }
    match at {
        Some(at) => {
            let head: String = chars[..at].iter().collect();
            let tail: String = chars[at..].iter().collect();
            format!("{head}\n{tail}")
        }
        None => text.to_string(),
    }
}

/// Dot double-quoted string escaping; newlines become label line breaks.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
