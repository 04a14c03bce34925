use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

const BUILTIN_REGISTRY_TOML: &str = include_str!("../default_registry.toml");

#[derive(Debug, Clone)]
pub enum RegistryError {
    Io { path: String, detail: String },
    Parse(String),
    Invalid(Vec<String>),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, detail } => write!(f, "failed to read registry {path}: {detail}"),
            Self::Parse(detail) => write!(f, "failed to parse registry: {detail}"),
            Self::Invalid(errors) => write!(f, "invalid registry: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Structural role of a type in the dependency graph. `Top` types need no
/// dependents, `Bottom` types need no dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeTag {
    Top,
    Bottom,
}

impl TypeTag {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            other => Err(format!("unrecognized type tag `{other}`")),
        }
    }
}

/// A required-dependency pattern, compiled once at registry load and matched
/// unanchored against candidate dependency type strings.
#[derive(Debug, Clone)]
pub struct DependencyPattern {
    source: String,
    regex: Regex,
}

impl DependencyPattern {
    pub fn parse(source: &str) -> Result<Self, String> {
        let regex = Regex::new(source)
            .map_err(|e| format!("invalid dependency pattern `{source}`: {e}"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn matches_type(&self, type_name: &str) -> bool {
        self.regex.is_match(type_name)
    }
}

#[derive(Debug, Clone)]
pub struct AssetTypeSpec {
    pub description: String,
    pub style: String,
    pub color: String,
    pub tags: BTreeSet<TypeTag>,
    pub required_fields: Vec<String>,
    pub required_dependency_patterns: Vec<DependencyPattern>,
    pub id_prefix: String,
}

impl AssetTypeSpec {
    #[must_use]
    pub fn is_top(&self) -> bool {
        self.tags.contains(&TypeTag::Top)
    }

    #[must_use]
    pub fn is_bottom(&self) -> bool {
        self.tags.contains(&TypeTag::Bottom)
    }
}

/// Static catalog of asset types, keyed by type name. Pluggable via a TOML
/// file; the builtin catalog mirrors the stock IT-asset taxonomy.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: BTreeMap<String, AssetTypeSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRegistry {
    types: BTreeMap<String, RawType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    description: String,
    #[serde(default)]
    style: String,
    #[serde(default)]
    color: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    required_fields: Vec<String>,
    #[serde(default)]
    required_dependency_patterns: Vec<String>,
    id_prefix: String,
}

impl TypeRegistry {
    pub fn from_toml_str(text: &str) -> Result<Self, RegistryError> {
        let raw: RawRegistry =
            toml::from_str(text).map_err(|e| RegistryError::Parse(e.to_string()))?;

        let mut errors = Vec::new();
        let mut types = BTreeMap::new();
        for (name, row) in raw.types {
            if row.description.trim().is_empty() {
                errors.push(format!("{name}: description must not be empty"));
            }
            if row.id_prefix.trim().is_empty() {
                errors.push(format!("{name}: id_prefix must not be empty"));
            }
            let mut tags = BTreeSet::new();
            for tag in &row.tags {
                match TypeTag::parse(tag) {
                    Ok(tag) => {
                        tags.insert(tag);
                    }
                    Err(e) => errors.push(format!("{name}: {e}")),
                }
            }
            let mut patterns = Vec::new();
            for source in &row.required_dependency_patterns {
                match DependencyPattern::parse(source) {
                    Ok(pattern) => patterns.push(pattern),
                    Err(e) => errors.push(format!("{name}: {e}")),
                }
            }
            types.insert(
                name,
                AssetTypeSpec {
                    description: row.description,
                    style: row.style,
                    color: row.color,
                    tags,
                    required_fields: row.required_fields,
                    required_dependency_patterns: patterns,
                    id_prefix: row.id_prefix,
                },
            );
        }

        if errors.is_empty() {
            Ok(Self { types })
        } else {
            Err(RegistryError::Invalid(errors))
        }
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Stock IT-asset catalog shipped with the crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_toml_str(BUILTIN_REGISTRY_TOML)
    }

    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&AssetTypeSpec> {
        self.types.get(type_name)
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssetTypeSpec)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Known id prefixes. Prefixes may be shared between types.
    #[must_use]
    pub fn prefixes(&self) -> BTreeSet<&str> {
        self.types.values().map(|t| t.id_prefix.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
