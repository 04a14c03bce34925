use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

/// Tags with meaning to the pipeline; anything else is free-form.
pub const RECOGNIZED_TAGS: &[&str] = &["archived", "needs_work"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("asset id must not be empty".to_string()));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(ValidationError(format!(
                "asset id `{s}` must not contain whitespace"
            )));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text before the first `_`, matched against registry id prefixes.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AssetId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetId> for String {
    fn from(value: AssetId) -> Self {
        value.0
    }
}

/// One `depends_on` entry: `<id> [free text]`, with two markers.
///
/// A leading `^` flags an intentional exclusion of an otherwise-expected
/// dependency; the substring `INSUF` flags an edge that exists but does not
/// satisfy a required-dependency-type check on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DependencyExpr {
    target: String,
    excluded: bool,
    insufficient: bool,
    raw: String,
}

impl DependencyExpr {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let raw = input.trim();
        let first = raw.split_whitespace().next().ok_or_else(|| {
            ValidationError("dependency expression must not be empty".to_string())
        })?;
        let excluded = first.starts_with('^');
        let target = first.trim_start_matches('^');
        if target.is_empty() {
            return Err(ValidationError(format!(
                "dependency expression `{raw}` has no target after `^`"
            )));
        }
        Ok(Self {
            target: target.to_string(),
            excluded,
            insufficient: raw.contains("INSUF"),
            raw: raw.to_string(),
        })
    }

    /// Dependency id (or, for exclusions, the excluded pattern) with `^` stripped.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    #[must_use]
    pub fn is_insufficient(&self) -> bool {
        self.insufficient
    }

    /// Free-text commentary after the id token.
    #[must_use]
    pub fn commentary(&self) -> &str {
        match self.raw.split_once(char::is_whitespace) {
            Some((_, rest)) => rest.trim(),
            None => "",
        }
    }

    #[must_use]
    pub fn as_raw(&self) -> &str {
        &self.raw
    }
}

impl Display for DependencyExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for DependencyExpr {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DependencyExpr> for String {
    fn from(value: DependencyExpr) -> Self {
        value.raw
    }
}

/// One inventory record. Typed fields cover everything the rules inspect;
/// anything else an inventory file carries lands in `extra` and is only
/// surfaced in tooltips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    #[serde(rename = "type", default)]
    pub asset_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<DependencyExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub closed_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
    #[serde(skip)]
    pub source: Option<PathBuf>,
    #[serde(skip)]
    pub placeholder: bool,
}

impl Asset {
    #[must_use]
    pub fn new(id: AssetId, asset_type: &str) -> Self {
        Self {
            id,
            asset_type: asset_type.to_string(),
            name: String::new(),
            depends_on: Vec::new(),
            location: None,
            owner: None,
            size: None,
            tags: Vec::new(),
            open_issues: Vec::new(),
            closed_issues: Vec::new(),
            notes: Vec::new(),
            links: Vec::new(),
            extra: BTreeMap::new(),
            source: None,
            placeholder: false,
        }
    }

    /// Stand-in for a dependency id with no matching record, so renderers
    /// always resolve both edge endpoints.
    #[must_use]
    pub fn missing_reference(id: AssetId) -> Self {
        let mut asset = Self::new(id, "missing");
        asset.name = "???".to_string();
        asset.placeholder = true;
        asset
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.has_tag("archived")
    }

    /// Presence-and-non-empty test used by required-field checks. Typed
    /// fields are checked directly, free-form fields through `extra`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        let non_empty = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        match field {
            "id" => true,
            "type" => !self.asset_type.trim().is_empty(),
            "name" => !self.name.trim().is_empty(),
            "depends_on" => !self.depends_on.is_empty(),
            "location" => non_empty(&self.location),
            "owner" => non_empty(&self.owner),
            "size" => non_empty(&self.size),
            "tags" => !self.tags.is_empty(),
            "open_issues" => !self.open_issues.is_empty(),
            "closed_issues" => !self.closed_issues.is_empty(),
            "notes" => !self.notes.is_empty(),
            "links" => !self.links.is_empty(),
            other => self.extra.get(other).is_some_and(|v| match v {
                serde_yaml::Value::Null => false,
                serde_yaml::Value::String(s) => !s.trim().is_empty(),
                serde_yaml::Value::Sequence(items) => !items.is_empty(),
                serde_yaml::Value::Mapping(map) => !map.is_empty(),
                _ => true,
            }),
        }
    }

    /// Scalar fields for tooltip rendering, in a stable order.
    #[must_use]
    pub fn scalar_fields(&self) -> Vec<(String, String)> {
        let mut out = vec![
            ("id".to_string(), self.id.to_string()),
            ("type".to_string(), self.asset_type.clone()),
        ];
        if !self.name.is_empty() {
            out.push(("name".to_string(), self.name.clone()));
        }
        for (key, value) in [
            ("location", &self.location),
            ("owner", &self.owner),
            ("size", &self.size),
        ] {
            if let Some(v) = value {
                out.push((key.to_string(), v.clone()));
            }
        }
        for (key, value) in &self.extra {
            if let serde_yaml::Value::String(s) = value {
                out.push((key.clone(), s.clone()));
            }
        }
        out
    }

    /// List fields for tooltip rendering, in a stable order.
    #[must_use]
    pub fn list_fields(&self) -> Vec<(String, &[String])> {
        let mut out: Vec<(String, &[String])> = Vec::new();
        for (key, value) in [
            ("tags", &self.tags),
            ("open_issues", &self.open_issues),
            ("closed_issues", &self.closed_issues),
            ("notes", &self.notes),
            ("links", &self.links),
        ] {
            if !value.is_empty() {
                out.push((key.to_string(), value.as_slice()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_rejects_empty_and_whitespace() {
        assert!(AssetId::parse("srv_1").is_ok());
        assert!(AssetId::parse("").is_err());
        assert!(AssetId::parse("srv 1").is_err());
        assert_eq!(AssetId::parse(" srv_1 ").map(|i| i.to_string()), Ok("srv_1".to_string()));
    }

    #[test]
    fn asset_id_prefix_is_text_before_first_underscore() {
        let id = AssetId::parse("psvc_web_1").expect("id");
        assert_eq!(id.prefix(), "psvc");
    }

    #[test]
    fn dependency_expr_plain() {
        let dep = DependencyExpr::parse("srv_1 the big box").expect("expr");
        assert_eq!(dep.target(), "srv_1");
        assert!(!dep.is_excluded());
        assert!(!dep.is_insufficient());
        assert_eq!(dep.commentary(), "the big box");
    }

    #[test]
    fn dependency_expr_exclusion_strips_caret() {
        let dep = DependencyExpr::parse("^resource/deployment not needed").expect("expr");
        assert_eq!(dep.target(), "resource/deployment");
        assert!(dep.is_excluded());
    }

    #[test]
    fn dependency_expr_insufficient_marker_anywhere() {
        let dep = DependencyExpr::parse("bak_1 INSUF only covers configs").expect("expr");
        assert!(dep.is_insufficient());
        let dep = DependencyExpr::parse("bak_1 covers everything").expect("expr");
        assert!(!dep.is_insufficient());
    }

    #[test]
    fn dependency_expr_rejects_empty() {
        assert!(DependencyExpr::parse("").is_err());
        assert!(DependencyExpr::parse("   ").is_err());
        assert!(DependencyExpr::parse("^").is_err());
    }

    #[test]
    fn asset_deserializes_from_yaml_with_extra_fields() {
        let yaml = r#"
id: app_1
type: application/external
name: Webshop
depends_on:
  - "psvc_1 main service"
  - "^resource/deployment vendored"
location: rack 4
custom_note: kept for audit
"#;
        let asset: Asset = serde_yaml::from_str(yaml).expect("asset");
        assert_eq!(asset.id.as_str(), "app_1");
        assert_eq!(asset.depends_on.len(), 2);
        assert!(asset.depends_on[1].is_excluded());
        assert!(asset.has_field("location"));
        assert!(asset.has_field("custom_note"));
        assert!(!asset.has_field("owner"));
    }

    #[test]
    fn missing_reference_is_flagged() {
        let asset = Asset::missing_reference(AssetId::parse("ghost_1").expect("id"));
        assert!(asset.placeholder);
        assert_eq!(asset.name, "???");
    }
}
