use inframap_model::{Asset, AssetId};
use std::collections::{BTreeMap, BTreeSet};

/// Synthesizes one stand-in record per unique dependency id the subset
/// references but does not contain, so edge-drawing code never
/// dereferences an absent node. Deterministic order, created on first
/// reference within one render pass.
#[must_use]
pub fn resolve_placeholders(subset: &[&Asset]) -> Vec<Asset> {
    let present: BTreeSet<&str> = subset.iter().map(|a| a.id.as_str()).collect();
    let mut missing: BTreeMap<String, Asset> = BTreeMap::new();

    for asset in subset {
        for expr in &asset.depends_on {
            if expr.is_excluded() || present.contains(expr.target()) {
                continue;
            }
            if missing.contains_key(expr.target()) {
                continue;
            }
            let Ok(id) = AssetId::parse(expr.target()) else {
                continue;
            };
            missing.insert(expr.target().to_string(), Asset::missing_reference(id));
        }
    }

    missing.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inframap_model::DependencyExpr;

    fn asset(id: &str, deps: &[&str]) -> Asset {
        let mut asset = Asset::new(AssetId::parse(id).expect("id"), "physical/server");
        asset.depends_on = deps
            .iter()
            .map(|d| DependencyExpr::parse(d).expect("dep"))
            .collect();
        asset
    }

    #[test]
    fn one_placeholder_per_unique_missing_id() {
        let a = asset("a_1", &["ghost_1", "b_1"]);
        let b = asset("b_1", &["ghost_1 again", "^excluded_1"]);
        let subset = vec![&a, &b];

        let placeholders = resolve_placeholders(&subset);
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].id.as_str(), "ghost_1");
        assert!(placeholders[0].placeholder);
    }

    #[test]
    fn complete_subset_needs_no_placeholders() {
        let a = asset("a_1", &["b_1"]);
        let b = asset("b_1", &[]);
        assert!(resolve_placeholders(&[&a, &b]).is_empty());
    }
}
