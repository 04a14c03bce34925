use crate::graph::DependencyGraph;
use crate::EngineError;
use inframap_model::{Asset, AssetId, AssetTypeSpec, Issue, IssueReport, TypeRegistry};
use regex::Regex;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    pub rule: &'static str,
    pub detail: String,
}

impl Display for RuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule `{}` failed: {}", self.rule, self.detail)
    }
}

impl std::error::Error for RuleError {}

/// A rule failure carries the asset it surfaced on; the partial issue list
/// gathered up to that point is already attached to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateError {
    pub asset: AssetId,
    pub error: RuleError,
}

impl Display for ValidateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validating {}: {}", self.asset, self.error)
    }
}

impl std::error::Error for ValidateError {}

pub struct RuleContext<'a, 'g> {
    pub asset: &'a Asset,
    pub graph: &'g DependencyGraph<'a>,
    pub registry: &'g TypeRegistry,
}

impl RuleContext<'_, '_> {
    #[must_use]
    pub fn type_spec(&self) -> Option<&AssetTypeSpec> {
        self.registry.get(&self.asset.asset_type)
    }
}

pub type RuleFn = fn(&RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError>;

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    /// Rules indexing the registry by the asset's own type are skipped for
    /// assets of unknown type instead of running degraded.
    pub needs_type_spec: bool,
    pub func: RuleFn,
}

struct RuleGroup {
    pattern_source: String,
    pattern: Regex,
    rules: Vec<Rule>,
}

/// Ordered table of validation rules keyed by a type-matching pattern.
/// Patterns compile once at registration and are matched unanchored
/// against each asset's type string.
#[derive(Default)]
pub struct RuleSet {
    groups: Vec<RuleGroup>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules registered under the same pattern keep registration order.
    pub fn register(&mut self, pattern: &str, rule: Rule) -> Result<(), EngineError> {
        if let Some(group) = self.groups.iter_mut().find(|g| g.pattern_source == pattern) {
            group.rules.push(rule);
            return Ok(());
        }
        let compiled = Regex::new(pattern).map_err(|e| EngineError::Pattern {
            pattern: pattern.to_string(),
            detail: e.to_string(),
        })?;
        self.groups.push(RuleGroup {
            pattern_source: pattern.to_string(),
            pattern: compiled,
            rules: vec![rule],
        });
        Ok(())
    }

    /// The stock rule table, all under the universal pattern.
    pub fn standard() -> Result<Self, EngineError> {
        let mut set = Self::new();
        for rule in STANDARD_RULES {
            set.register(".*", *rule)?;
        }
        Ok(set)
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum()
    }
}

const STANDARD_RULES: &[Rule] = &[
    Rule {
        name: "known_asset_type",
        needs_type_spec: false,
        func: known_asset_type,
    },
    Rule {
        name: "no_undefined_dependency",
        needs_type_spec: false,
        func: no_undefined_dependency,
    },
    Rule {
        name: "known_id_prefix",
        needs_type_spec: false,
        func: known_id_prefix,
    },
    Rule {
        name: "dependents_unless_top",
        needs_type_spec: true,
        func: dependents_unless_top,
    },
    Rule {
        name: "dependencies_unless_bottom",
        needs_type_spec: true,
        func: dependencies_unless_bottom,
    },
    Rule {
        name: "open_issue_flag",
        needs_type_spec: false,
        func: open_issue_flag,
    },
    Rule {
        name: "needs_work_tag",
        needs_type_spec: false,
        func: needs_work_tag,
    },
    Rule {
        name: "required_fields",
        needs_type_spec: true,
        func: required_fields,
    },
    Rule {
        name: "required_dependency_types",
        needs_type_spec: true,
        func: required_dependency_types,
    },
];

/// Runs every rule whose pattern matches each asset's type, in
/// registration order, and returns the per-asset findings. If a rule
/// fails, the issues gathered for that asset so far are attached to the
/// report inside the returned error's context before it surfaces.
pub fn validate(
    assets: &[Asset],
    graph: &DependencyGraph<'_>,
    registry: &TypeRegistry,
    rules: &RuleSet,
) -> Result<IssueReport, (IssueReport, ValidateError)> {
    let mut report = IssueReport::new();

    for asset in assets {
        let ctx = RuleContext {
            asset,
            graph,
            registry,
        };
        let type_known = registry.contains(&asset.asset_type);
        let mut issues = Vec::new();
        let mut skipped_type_rules = false;

        for group in &rules.groups {
            if !group.pattern.is_match(&asset.asset_type) {
                continue;
            }
            for rule in &group.rules {
                if rule.needs_type_spec && !type_known {
                    skipped_type_rules = true;
                    continue;
                }
                match (rule.func)(&ctx) {
                    Ok(found) => issues.extend(found),
                    Err(error) => {
                        report.attach(&asset.id, issues);
                        return Err((
                            report,
                            ValidateError {
                                asset: asset.id.clone(),
                                error,
                            },
                        ));
                    }
                }
            }
        }

        if skipped_type_rules {
            issues.push(Issue::note(
                "type-dependent checks skipped for unknown type",
            ));
        }
        if !issues.is_empty() {
            tracing::debug!(asset = %asset.id, issues = issues.len(), "validation findings");
        }
        report.attach(&asset.id, issues);
    }

    Ok(report)
}

fn known_asset_type(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    if ctx.type_spec().is_none() {
        return Ok(vec![Issue::error(format!(
            "has unknown type `{}`",
            ctx.asset.asset_type
        ))]);
    }
    Ok(Vec::new())
}

fn no_undefined_dependency(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    let mut issues = Vec::new();
    for expr in &ctx.asset.depends_on {
        if expr.is_excluded() {
            continue;
        }
        if !ctx.graph.contains(expr.target()) {
            issues.push(Issue::warning(format!(
                "depends on undefined asset id={}",
                expr.target()
            )));
        }
    }
    Ok(issues)
}

fn known_id_prefix(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    let prefix = ctx.asset.id.prefix();
    if !ctx.registry.prefixes().contains(prefix) {
        return Ok(vec![Issue::warning(format!(
            "has unknown id prefix `{prefix}`"
        ))]);
    }
    Ok(Vec::new())
}

fn dependents_unless_top(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    let Some(spec) = ctx.type_spec() else {
        return Ok(Vec::new());
    };
    if !spec.is_top() && ctx.graph.dependents_of(ctx.asset.id.as_str()).is_empty() {
        return Ok(vec![Issue::warning(
            "non-top-level asset has no dependents",
        )]);
    }
    Ok(Vec::new())
}

fn dependencies_unless_bottom(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    let Some(spec) = ctx.type_spec() else {
        return Ok(Vec::new());
    };
    if !spec.is_bottom() && ctx.asset.depends_on.is_empty() {
        return Ok(vec![Issue::warning(
            "non-bottom-level asset has no dependencies",
        )]);
    }
    Ok(Vec::new())
}

fn open_issue_flag(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    if !ctx.asset.open_issues.is_empty() {
        return Ok(vec![Issue::warning("has open issues")]);
    }
    Ok(Vec::new())
}

fn needs_work_tag(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    if ctx.asset.has_tag("needs_work") {
        return Ok(vec![Issue::warning("has `needs_work` tag")]);
    }
    Ok(Vec::new())
}

fn required_fields(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    let Some(spec) = ctx.type_spec() else {
        return Ok(Vec::new());
    };
    let mut issues = Vec::new();
    for field in &spec.required_fields {
        if !ctx.asset.has_field(field) {
            issues.push(Issue::warning(format!(
                "`{}` definition missing `{field}` field",
                ctx.asset.asset_type
            )));
        }
    }
    Ok(issues)
}

fn required_dependency_types(ctx: &RuleContext<'_, '_>) -> Result<Vec<Issue>, RuleError> {
    let Some(spec) = ctx.type_spec() else {
        return Ok(Vec::new());
    };
    let mut issues = Vec::new();
    for pattern in &spec.required_dependency_patterns {
        let excluded = ctx
            .asset
            .depends_on
            .iter()
            .any(|e| e.is_excluded() && e.target() == pattern.source());
        if excluded {
            issues.push(Issue::note(format!(
                "specifically excludes `{}` dependency",
                pattern.source()
            )));
            continue;
        }
        let satisfied = ctx
            .asset
            .depends_on
            .iter()
            .filter(|e| !e.is_excluded() && !e.is_insufficient())
            .filter_map(|e| ctx.graph.resolve(e.target()))
            .any(|dep| pattern.matches_type(&dep.asset_type));
        if !satisfied {
            issues.push(Issue::warning(format!(
                "`{}` should define `{}` dependency",
                ctx.asset.asset_type,
                pattern.source()
            )));
        }
    }
    Ok(issues)
}
