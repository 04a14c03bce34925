use inframap_model::Asset;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateId {
    pub id: String,
    pub first: Option<PathBuf>,
    pub second: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Identity-based indexing is ambiguous once an id repeats, so the
    /// whole run stops before any per-asset validation.
    DuplicateIdentifier { duplicates: Vec<DuplicateId> },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateIdentifier { duplicates } => {
                write!(f, "duplicate asset identifiers:")?;
                for dup in duplicates {
                    let first = dup
                        .first
                        .as_ref()
                        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
                    let second = dup
                        .second
                        .as_ref()
                        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
                    write!(f, " {} (first in {first}, again in {second})", dup.id)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Id-indexed view over one asset snapshot: `lookup` resolves ids to arena
/// indices, `dependents` inverts the declared dependency edges. Every
/// extracted dependency id appears as a `dependents` key, including ids
/// with no matching asset; `^`-exclusions are not edges and are left out.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    assets: &'a [Asset],
    lookup: BTreeMap<String, usize>,
    dependents: BTreeMap<String, Vec<String>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn build(assets: &'a [Asset]) -> Result<Self, GraphError> {
        let mut lookup: BTreeMap<String, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut duplicates = Vec::new();

        for (index, asset) in assets.iter().enumerate() {
            let id = asset.id.as_str();
            if let Some(&seen) = lookup.get(id) {
                duplicates.push(DuplicateId {
                    id: id.to_string(),
                    first: assets[seen].source.clone(),
                    second: asset.source.clone(),
                });
            } else {
                lookup.insert(id.to_string(), index);
            }
            for expr in &asset.depends_on {
                if expr.is_excluded() {
                    continue;
                }
                dependents
                    .entry(expr.target().to_string())
                    .or_default()
                    .push(id.to_string());
            }
        }

        if duplicates.is_empty() {
            Ok(Self {
                assets,
                lookup,
                dependents,
            })
        } else {
            Err(GraphError::DuplicateIdentifier { duplicates })
        }
    }

    #[must_use]
    pub fn assets(&self) -> &'a [Asset] {
        self.assets
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<&'a Asset> {
        self.index_of(id).map(|i| &self.assets[i])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    /// Ids of assets directly depending on `id`, in input order. Repeated
    /// declarations repeat here too.
    #[must_use]
    pub fn dependents_of(&self, id: &str) -> &[String] {
        self.dependents.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn dependent_keys(&self) -> impl Iterator<Item = &str> {
        self.dependents.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inframap_model::AssetId;
    use std::path::Path;

    fn asset(id: &str, deps: &[&str]) -> Asset {
        let mut asset = Asset::new(AssetId::parse(id).expect("id"), "physical/server");
        asset.depends_on = deps
            .iter()
            .map(|d| inframap_model::DependencyExpr::parse(d).expect("dep"))
            .collect();
        asset
    }

    #[test]
    fn build_indexes_and_inverts_edges() {
        let assets = vec![
            asset("srv_1", &[]),
            asset("psvc_1", &["srv_1 main box"]),
            asset("app_1", &["psvc_1", "ghost_1"]),
        ];
        let graph = DependencyGraph::build(&assets).expect("graph");
        assert_eq!(graph.index_of("srv_1"), Some(0));
        assert_eq!(graph.dependents_of("srv_1"), ["psvc_1".to_string()]);
        assert_eq!(graph.dependents_of("psvc_1"), ["app_1".to_string()]);
        // undefined targets still appear as dependent keys
        assert_eq!(graph.dependents_of("ghost_1"), ["app_1".to_string()]);
        assert!(!graph.contains("ghost_1"));
    }

    #[test]
    fn exclusions_are_not_edges() {
        let assets = vec![asset("app_1", &["^resource/deployment vendored"])];
        let graph = DependencyGraph::build(&assets).expect("graph");
        assert!(graph.dependents_of("resource/deployment").is_empty());
    }

    #[test]
    fn duplicate_ids_fail_with_both_locations() {
        let mut first = asset("srv_1", &[]);
        first.source = Some(Path::new("a.yaml").to_path_buf());
        let mut second = asset("srv_1", &[]);
        second.source = Some(Path::new("b.yaml").to_path_buf());
        let assets = vec![first, second, asset("srv_2", &[])];

        let err = DependencyGraph::build(&assets).expect_err("must fail");
        let GraphError::DuplicateIdentifier { duplicates } = err;
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].id, "srv_1");
        assert_eq!(duplicates[0].first.as_deref(), Some(Path::new("a.yaml")));
        assert_eq!(duplicates[0].second.as_deref(), Some(Path::new("b.yaml")));
    }

    #[test]
    fn all_duplicates_are_reported() {
        let assets = vec![
            asset("srv_1", &[]),
            asset("srv_1", &[]),
            asset("srv_2", &[]),
            asset("srv_2", &[]),
        ];
        let GraphError::DuplicateIdentifier { duplicates } =
            DependencyGraph::build(&assets).expect_err("must fail");
        assert_eq!(duplicates.len(), 2);
    }
}
