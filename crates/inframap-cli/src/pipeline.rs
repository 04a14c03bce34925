use crate::load::{load_inventory, split_archived, General};
use inframap_engine::{
    resolve_placeholders, select, validate, DependencyGraph, GraphAnnotations, GraphError,
    LabelField, RuleSet, TraversalLimits,
};
use inframap_model::{Asset, IssueReport, TypeRegistry};
use inframap_render::{render_dot, render_json, GraphvizRunner, Theme};
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    Internal = 10,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    Usage(String),
    Validation(String),
    Internal(String),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Usage(_) => ExitCode::Usage,
            Self::Validation(_) => ExitCode::Validation,
            Self::Internal(_) => ExitCode::Internal,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(msg) | Self::Validation(msg) | Self::Internal(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub assets: Vec<PathBuf>,
    pub output: PathBuf,
    pub theme: Theme,
    pub leaf_type: Option<String>,
    pub leaf_negate: bool,
    pub updated: Option<String>,
    pub registry: Option<PathBuf>,
    pub render_svg: bool,
}

#[derive(Debug)]
pub struct RunSummary {
    pub title: String,
    pub asset_count: usize,
    pub archived_count: usize,
    pub views_written: usize,
    pub svg_failures: usize,
    pub report: IssueReport,
}

/// One focused output graph; `pattern` is matched against the propagated
/// labels of `field`.
struct View {
    base: String,
    field: LabelField,
    pattern: String,
    negate: bool,
}

fn views(registry: &TypeRegistry, assets: &[Asset]) -> Vec<View> {
    let mut views = vec![
        View {
            base: "index".to_string(),
            field: LabelField::Type,
            pattern: ".*".to_string(),
            negate: false,
        },
        View {
            base: "_unapplied".to_string(),
            field: LabelField::Type,
            pattern: "application/.*".to_string(),
            negate: true,
        },
    ];
    for type_name in registry.type_names() {
        views.push(View {
            base: format!("_{}", type_name.replace('/', "_")),
            field: LabelField::Type,
            pattern: type_name.to_string(),
            negate: false,
        });
    }
    for asset in assets {
        if asset.asset_type.starts_with("application/") {
            views.push(View {
                base: format!("_{}", asset.id),
                field: LabelField::Id,
                pattern: regex::escape(asset.id.as_str()),
                negate: false,
            });
        }
    }
    views
}

/// Load, validate, annotate, and write every view. Findings come back in
/// the summary; only unusable input or a broken environment is an error.
pub fn run(options: &RunOptions, graphviz: &dyn GraphvizRunner) -> Result<RunSummary, CliError> {
    let registry = match &options.registry {
        Some(path) => TypeRegistry::load(path)
            .map_err(|e| CliError::Usage(format!("registry {}: {e}", path.display())))?,
        None => TypeRegistry::builtin().map_err(|e| CliError::Internal(e.to_string()))?,
    };

    let mut general: Option<General> = None;
    let mut assets: Vec<Asset> = Vec::new();
    for path in &options.assets {
        let (file_general, file_assets) = load_inventory(path)?;
        debug!(file = %path.display(), assets = file_assets.len(), "loaded inventory");
        if general.is_none() {
            general = file_general;
        }
        assets.extend(file_assets);
    }
    let (mut assets, archived) = split_archived(assets);
    let archived_count = archived.len();

    let graph = DependencyGraph::build(&assets).map_err(|e| {
        let GraphError::DuplicateIdentifier { duplicates } = &e;
        for dup in duplicates {
            warn!(id = %dup.id, "duplicate asset id");
        }
        CliError::Validation(e.to_string())
    })?;

    let rules = RuleSet::standard().map_err(|e| CliError::Internal(e.to_string()))?;
    let report = match validate(&assets, &graph, &registry, &rules) {
        Ok(report) => report,
        Err((partial, e)) => {
            return Err(CliError::Internal(format!(
                "{e} ({} assets already had findings)",
                partial.asset_count()
            )));
        }
    };

    let annotations = GraphAnnotations::compute(&assets, &graph, &TraversalLimits::default())
        .map_err(|e| CliError::Internal(e.to_string()))?;

    // --leaf-type trims the whole run before views are carved out
    if let Some(leaf) = &options.leaf_type {
        let regex = Regex::new(leaf)
            .map_err(|e| CliError::Usage(format!("invalid --leaf-type `{leaf}`: {e}")))?;
        let before = assets.len();
        let types = annotations.labels(LabelField::Type);
        assets.retain(|a| {
            let hit = types
                .get(a.id.as_str())
                .is_some_and(|set| set.iter().any(|t| regex.is_match(t)));
            hit != options.leaf_negate
        });
        info!(shown = assets.len(), total = before, "trimmed to leaf type");
    }

    // rebuild over the trimmed set so node indices line up
    let graph = DependencyGraph::build(&assets).map_err(|e| CliError::Internal(e.to_string()))?;
    let annotations = GraphAnnotations::compute(&assets, &graph, &TraversalLimits::default())
        .map_err(|e| CliError::Internal(e.to_string()))?;

    let title = build_title(general.as_ref(), options.updated.as_deref());

    fs::create_dir_all(&options.output).map_err(|e| {
        CliError::Internal(format!(
            "failed to create {}: {e}",
            options.output.display()
        ))
    })?;

    let mut views_written = 0;
    let mut svg_failures = 0;
    for view in views(&registry, &assets) {
        let subset = select(
            &assets,
            &graph,
            annotations.labels(view.field),
            &view.pattern,
            view.negate,
        )
        .map_err(|e| CliError::Internal(e.to_string()))?;
        info!(view = %view.base, shown = subset.len(), total = assets.len(), "writing view");

        let placeholders = resolve_placeholders(&subset);
        let dot = render_dot(
            &subset,
            &placeholders,
            &report,
            &registry,
            &options.theme,
            &title,
        );
        let dot_path = options.output.join(format!("{}.dot", view.base));
        fs::write(&dot_path, dot)
            .map_err(|e| CliError::Internal(format!("failed to write {}: {e}", dot_path.display())))?;
        views_written += 1;

        if options.render_svg {
            let svg_path = options.output.join(format!("{}.svg", view.base));
            if let Err(e) = graphviz.render_svg(&dot_path, &svg_path) {
                warn!(view = %view.base, error = %e, "svg generation failed");
                svg_failures += 1;
            }
        }
    }

    let json = render_json(&report).map_err(|e| CliError::Internal(e.to_string()))?;
    let json_path = options.output.join("issues.json");
    fs::write(&json_path, json)
        .map_err(|e| CliError::Internal(format!("failed to write {}: {e}", json_path.display())))?;

    Ok(RunSummary {
        title,
        asset_count: assets.len(),
        archived_count,
        views_written,
        svg_failures,
        report,
    })
}

/// `<general title> updated <when>`, defaulting to the current local time
/// so regenerated maps are visibly fresh.
fn build_title(general: Option<&General>, updated: Option<&str>) -> String {
    let title = general.map(|g| g.title.as_str()).unwrap_or_default();
    let updated = match updated {
        Some(when) => when.to_string(),
        None => chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string(),
    };
    format!("{title} updated {updated}")
}
