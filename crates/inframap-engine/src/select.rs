use crate::graph::DependencyGraph;
use crate::EngineError;
use inframap_model::Asset;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Subset of assets relevant to a focused view.
///
/// Non-negated: assets whose label set contains a full match of `pattern`.
/// Negated: the complement, expanded to a dependency-closed fixpoint so no
/// included asset references an excluded one.
pub fn select<'a>(
    assets: &'a [Asset],
    graph: &DependencyGraph<'a>,
    labels: &BTreeMap<String, BTreeSet<String>>,
    pattern: &str,
    negate: bool,
) -> Result<Vec<&'a Asset>, EngineError> {
    let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| EngineError::Pattern {
        pattern: pattern.to_string(),
        detail: e.to_string(),
    })?;

    let matched: BTreeSet<usize> = assets
        .iter()
        .enumerate()
        .filter(|(_, a)| {
            labels
                .get(a.id.as_str())
                .is_some_and(|set| set.iter().any(|label| anchored.is_match(label)))
        })
        .map(|(i, _)| i)
        .collect();

    let mut kept: BTreeSet<usize> = if negate {
        (0..assets.len()).filter(|i| !matched.contains(i)).collect()
    } else {
        matched
    };

    if negate {
        loop {
            let mut added = false;
            for index in kept.clone() {
                for expr in &assets[index].depends_on {
                    if expr.is_excluded() {
                        continue;
                    }
                    if let Some(dep_index) = graph.index_of(expr.target()) {
                        if kept.insert(dep_index) {
                            added = true;
                        }
                    }
                }
            }
            if !added {
                break;
            }
        }
    }

    Ok(kept.into_iter().map(|i| &assets[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagate::{propagate, LabelField, TraversalLimits};
    use inframap_model::{AssetId, DependencyExpr};

    fn asset(id: &str, type_name: &str, deps: &[&str]) -> Asset {
        let mut asset = Asset::new(AssetId::parse(id).expect("id"), type_name);
        asset.depends_on = deps
            .iter()
            .map(|d| DependencyExpr::parse(d).expect("dep"))
            .collect();
        asset
    }

    fn fixture() -> Vec<Asset> {
        vec![
            asset("srv_1", "physical/server", &[]),
            asset("psvc_1", "physical/server/service", &["srv_1"]),
            asset("app_1", "application/external", &["psvc_1"]),
            asset("bak_1", "backup", &["srv_1"]),
        ]
    }

    fn ids(subset: &[&Asset]) -> Vec<String> {
        subset.iter().map(|a| a.id.to_string()).collect()
    }

    #[test]
    fn selects_assets_leading_to_matching_label() {
        let assets = fixture();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let labels = propagate(&assets, &graph, LabelField::Type, &TraversalLimits::default())
            .expect("propagate");

        let subset =
            select(&assets, &graph, &labels, "application/.*", false).expect("select");
        assert_eq!(subset.len(), 3);
        assert!(!ids(&subset).contains(&"bak_1".to_string()));
    }

    #[test]
    fn full_match_is_anchored() {
        let assets = fixture();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let labels = propagate(&assets, &graph, LabelField::Type, &TraversalLimits::default())
            .expect("propagate");

        // `physical/server` must not match `physical/server/service`
        let subset = select(&assets, &graph, &labels, "physical/server", false).expect("select");
        assert_eq!(ids(&subset), vec!["srv_1"]);
    }

    #[test]
    fn negated_selection_is_dependency_closed() {
        let assets = fixture();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let labels = propagate(&assets, &graph, LabelField::Type, &TraversalLimits::default())
            .expect("propagate");

        let subset =
            select(&assets, &graph, &labels, "application/.*", true).expect("select");
        // bak_1 does not lead to an application; its dependency srv_1 is
        // pulled back in to keep the subgraph closed.
        let got = ids(&subset);
        assert!(got.contains(&"bak_1".to_string()));
        assert!(got.contains(&"srv_1".to_string()));
        assert!(!got.contains(&"app_1".to_string()));
        assert!(!got.contains(&"psvc_1".to_string()));
    }

    #[test]
    fn id_labels_carve_single_asset_views() {
        let assets = fixture();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let labels = propagate(&assets, &graph, LabelField::Id, &TraversalLimits::default())
            .expect("propagate");

        let subset = select(&assets, &graph, &labels, "app_1", false).expect("select");
        assert_eq!(ids(&subset), vec!["srv_1", "psvc_1", "app_1"]);
    }

    #[test]
    fn bad_pattern_is_reported() {
        let assets = fixture();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let labels = BTreeMap::new();
        assert!(matches!(
            select(&assets, &graph, &labels, "(unclosed", false),
            Err(EngineError::Pattern { .. })
        ));
    }
}
