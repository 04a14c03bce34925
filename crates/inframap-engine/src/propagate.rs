use crate::graph::DependencyGraph;
use crate::EngineError;
use inframap_model::Asset;
use std::collections::{BTreeMap, BTreeSet};

/// Which label each root contributes to the assets it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelField {
    Type,
    Id,
}

impl LabelField {
    fn of(self, asset: &Asset) -> String {
        match self {
            Self::Type => asset.asset_type.clone(),
            Self::Id => asset.id.to_string(),
        }
    }
}

/// Cycle safety comes from the per-root visited set; the step budget
/// makes a pathological graph fail predictably instead of running
/// unbounded. Cost is O(N*E) across roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalLimits {
    pub max_steps: usize,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
        }
    }
}

/// Transitive label sets per asset id: for every root, the root's label is
/// pushed backward along the root's own dependency edges, so each asset
/// ends up knowing the labels of everything that transitively depends on
/// it (its own label included).
pub fn propagate(
    assets: &[Asset],
    graph: &DependencyGraph<'_>,
    field: LabelField,
    limits: &TraversalLimits,
) -> Result<BTreeMap<String, BTreeSet<String>>, EngineError> {
    let mut out: BTreeMap<String, BTreeSet<String>> = assets
        .iter()
        .map(|a| (a.id.to_string(), BTreeSet::new()))
        .collect();
    let mut steps = 0usize;

    for root in assets {
        let label = field.of(root);
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&Asset> = vec![root];

        while let Some(node) = stack.pop() {
            steps += 1;
            if steps > limits.max_steps {
                return Err(EngineError::TraversalBudget { steps });
            }
            if let Some(labels) = out.get_mut(node.id.as_str()) {
                labels.insert(label.clone());
            }
            for expr in &node.depends_on {
                if expr.is_excluded() {
                    continue;
                }
                if !seen.insert(expr.target()) {
                    continue;
                }
                if let Some(dep) = graph.resolve(expr.target()) {
                    stack.push(dep);
                }
            }
        }
    }

    Ok(out)
}

/// Both closures the views consume, computed in one pass over the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphAnnotations {
    pub dependent_types: BTreeMap<String, BTreeSet<String>>,
    pub dependent_ids: BTreeMap<String, BTreeSet<String>>,
}

impl GraphAnnotations {
    pub fn compute(
        assets: &[Asset],
        graph: &DependencyGraph<'_>,
        limits: &TraversalLimits,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            dependent_types: propagate(assets, graph, LabelField::Type, limits)?,
            dependent_ids: propagate(assets, graph, LabelField::Id, limits)?,
        })
    }

    #[must_use]
    pub fn labels(&self, field: LabelField) -> &BTreeMap<String, BTreeSet<String>> {
        match field {
            LabelField::Type => &self.dependent_types,
            LabelField::Id => &self.dependent_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inframap_model::{AssetId, DependencyExpr};

    fn asset(id: &str, type_name: &str, deps: &[&str]) -> Asset {
        let mut asset = Asset::new(AssetId::parse(id).expect("id"), type_name);
        asset.depends_on = deps
            .iter()
            .map(|d| DependencyExpr::parse(d).expect("dep"))
            .collect();
        asset
    }

    fn chain() -> Vec<Asset> {
        vec![
            asset("srv_1", "physical/server", &[]),
            asset("psvc_1", "physical/server/service", &["srv_1"]),
            asset("app_1", "application/external", &["psvc_1"]),
        ]
    }

    #[test]
    fn labels_are_reflexive() {
        let assets = chain();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let types = propagate(&assets, &graph, LabelField::Type, &TraversalLimits::default())
            .expect("propagate");
        for a in &assets {
            assert!(types[a.id.as_str()].contains(&a.asset_type));
        }
    }

    #[test]
    fn labels_flow_backward_along_dependency_edges() {
        let assets = chain();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let types = propagate(&assets, &graph, LabelField::Type, &TraversalLimits::default())
            .expect("propagate");

        // the bottom server learns about everything stacked on it
        let srv = &types["srv_1"];
        assert!(srv.contains("application/external"));
        assert!(srv.contains("physical/server/service"));
        // the application learns nothing from below
        assert_eq!(
            types["app_1"],
            BTreeSet::from(["application/external".to_string()])
        );
    }

    #[test]
    fn id_labels_support_single_asset_views() {
        let assets = chain();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let ids = propagate(&assets, &graph, LabelField::Id, &TraversalLimits::default())
            .expect("propagate");
        assert!(ids["srv_1"].contains("app_1"));
        assert!(ids["psvc_1"].contains("app_1"));
        assert!(!ids["app_1"].contains("srv_1"));
    }

    #[test]
    fn cycles_terminate_per_root() {
        let assets = vec![
            asset("a_1", "t", &["b_1"]),
            asset("b_1", "t", &["a_1"]),
        ];
        let graph = DependencyGraph::build(&assets).expect("graph");
        let ids = propagate(&assets, &graph, LabelField::Id, &TraversalLimits::default())
            .expect("propagate");
        assert!(ids["a_1"].contains("b_1"));
        assert!(ids["b_1"].contains("a_1"));
    }

    #[test]
    fn step_budget_fails_predictably() {
        let assets = chain();
        let graph = DependencyGraph::build(&assets).expect("graph");
        let err = propagate(
            &assets,
            &graph,
            LabelField::Type,
            &TraversalLimits { max_steps: 2 },
        )
        .expect_err("must fail");
        assert!(matches!(err, EngineError::TraversalBudget { .. }));
    }
}
