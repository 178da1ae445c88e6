//! Platform format descriptors ("patterns") and the catalog that holds them.

use monnaie_core::{columns, AccountKind};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::detect;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read pattern file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed pattern document {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unknown format: '{0}'")]
    UnknownFormat(String),
    #[error("Format '{0}' has no horizontalMapping")]
    MissingFieldMapping(String),
    #[error("Format '{format}' does not map required field '{field}'")]
    MissingCanonicalField { format: String, field: String },
    #[error("Format '{format}' names group column '{field}' which it does not map")]
    UnknownGroupColumn { format: String, field: String },
}

/// The closed set of platforms the catalog knows how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Comchain,
    Cyclos,
    Kohinos,
}

impl FromStr for FormatKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "comchain" => Ok(FormatKind::Comchain),
            "cyclos" => Ok(FormatKind::Cyclos),
            "kohinos" => Ok(FormatKind::Kohinos),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Comchain => write!(f, "comchain"),
            FormatKind::Cyclos => write!(f, "cyclos"),
            FormatKind::Kohinos => write!(f, "kohinos"),
        }
    }
}

/// Canonical field -> raw column, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMapping {
    fields: Vec<(String, String)>,
}

impl FieldMapping {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn canonical_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn raw_columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, r)| r.as_str())
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.fields.iter().any(|(c, _)| c == canonical)
    }
}

/// Keyword lists, stored lowercased. Checked in order vault, professional, individual.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeywordLists {
    pub vault: Vec<String>,
    pub professional: Vec<String>,
    pub individual: Vec<String>,
}

impl KeywordLists {
    pub fn new(vault: Vec<String>, professional: Vec<String>, individual: Vec<String>) -> Self {
        let lower = |v: Vec<String>| v.into_iter().map(|k| k.to_lowercase()).collect();
        Self {
            vault: lower(vault),
            professional: lower(professional),
            individual: lower(individual),
        }
    }
}

/// A substring pattern (lowercased) and the account kind it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRule {
    pub pattern: String,
    pub kind: AccountKind,
}

/// Per-platform classification rules.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationRules {
    /// Comchain: professional then individual keywords, no vault list.
    Keywords(KeywordLists),
    /// Kohinos: independent label tables for each side.
    LabelMapping {
        sender: Vec<LabelRule>,
        recipient: Vec<LabelRule>,
    },
    /// Cyclos: full keyword lists, optional group columns, blank-is-vault switch.
    GroupAware {
        keywords: KeywordLists,
        sender_group: Option<String>,
        recipient_group: Option<String>,
        empty_means_vault: bool,
    },
}

/// One source platform's export layout and classification rules.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    pub name: String,
    pub kind: FormatKind,
    pub field_mapping: FieldMapping,
    pub rules: ClassificationRules,
}

// ── pattern documents ─────────────────────────────────────────────────────────

/// On-disk shape of a pattern file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDocument {
    pub name: String,
    #[serde(default, deserialize_with = "ordered::deserialize_some")]
    pub horizontal_mapping: Option<Vec<(String, String)>>,
    #[serde(default)]
    pub vertical_mapping_rules: VerticalRules,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalRules {
    #[serde(default)]
    pub keywords: KeywordDocument,
    #[serde(default, deserialize_with = "ordered::deserialize")]
    pub exp_type_mapping: Vec<(String, String)>,
    #[serde(default, deserialize_with = "ordered::deserialize")]
    pub dest_type_mapping: Vec<(String, String)>,
    #[serde(default)]
    pub empty_means_coffre: bool,
    #[serde(default)]
    pub group_columns: Option<GroupColumns>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordDocument {
    #[serde(rename = "Coffre", default)]
    pub coffre: Vec<String>,
    #[serde(rename = "Professionnel", default)]
    pub professionnel: Vec<String>,
    #[serde(rename = "Particulier", default)]
    pub particulier: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupColumns {
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

/// JSON objects as ordered key/value pairs; key order carries meaning here.
mod ordered {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use std::fmt;
    use std::marker::PhantomData;

    struct PairsVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for PairsVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a JSON object")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                pairs.push((key, value));
            }
            Ok(pairs)
        }
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        deserializer.deserialize_map(PairsVisitor(PhantomData))
    }

    pub fn deserialize_some<'de, D, V>(deserializer: D) -> Result<Option<Vec<(String, V)>>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        deserialize(deserializer).map(Some)
    }
}

impl PatternDocument {
    pub fn from_json(origin: &str, json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json {
            origin: origin.to_string(),
            source,
        })
    }
}

impl FormatDescriptor {
    pub fn from_document(doc: PatternDocument) -> Result<Self, ConfigError> {
        let kind: FormatKind = doc.name.parse()?;
        let field_mapping = FieldMapping::new(
            doc.horizontal_mapping
                .ok_or_else(|| ConfigError::MissingFieldMapping(doc.name.clone()))?,
        );
        for field in columns::REQUIRED {
            if !field_mapping.contains(field) {
                return Err(ConfigError::MissingCanonicalField {
                    format: doc.name.clone(),
                    field: field.to_string(),
                });
            }
        }

        let vertical = doc.vertical_mapping_rules;
        let rules = match kind {
            FormatKind::Comchain => {
                if !vertical.keywords.coffre.is_empty() {
                    tracing::warn!(
                        format = %doc.name,
                        "Coffre keywords are not used by this format; unmatched accounts are already vault"
                    );
                }
                ClassificationRules::Keywords(KeywordLists::new(
                    Vec::new(),
                    vertical.keywords.professionnel,
                    vertical.keywords.particulier,
                ))
            }
            FormatKind::Kohinos => ClassificationRules::LabelMapping {
                sender: label_rules(&doc.name, vertical.exp_type_mapping),
                recipient: label_rules(&doc.name, vertical.dest_type_mapping),
            },
            FormatKind::Cyclos => {
                let groups = vertical.group_columns.unwrap_or_default();
                let sender_group =
                    group_column(&doc.name, &field_mapping, groups.sender, columns::SENDER_GROUP)?;
                let recipient_group = group_column(
                    &doc.name,
                    &field_mapping,
                    groups.recipient,
                    columns::RECIPIENT_GROUP,
                )?;
                ClassificationRules::GroupAware {
                    keywords: KeywordLists::new(
                        vertical.keywords.coffre,
                        vertical.keywords.professionnel,
                        vertical.keywords.particulier,
                    ),
                    sender_group,
                    recipient_group,
                    empty_means_vault: vertical.empty_means_coffre,
                }
            }
        };

        Ok(FormatDescriptor {
            name: doc.name,
            kind,
            field_mapping,
            rules,
        })
    }
}

/// Only professional and individual labels classify; anything else is skipped
/// so that a later entry can still match.
fn label_rules(format: &str, mapping: Vec<(String, String)>) -> Vec<LabelRule> {
    mapping
        .into_iter()
        .filter_map(|(pattern, label)| match AccountKind::from_label(&label) {
            Some(kind @ (AccountKind::Professional | AccountKind::Individual)) => Some(LabelRule {
                pattern: pattern.to_lowercase(),
                kind,
            }),
            _ => {
                tracing::warn!(format = %format, pattern = %pattern, label = %label, "ignoring unknown category label");
                None
            }
        })
        .collect()
}

fn group_column(
    format: &str,
    mapping: &FieldMapping,
    declared: Option<String>,
    default: &str,
) -> Result<Option<String>, ConfigError> {
    match declared {
        Some(field) if mapping.contains(&field) => Ok(Some(field)),
        Some(field) => Err(ConfigError::UnknownGroupColumn {
            format: format.to_string(),
            field,
        }),
        None if mapping.contains(default) => Ok(Some(default.to_string())),
        None => Ok(None),
    }
}

// ── catalog ───────────────────────────────────────────────────────────────────

const BUILTIN_PATTERNS: [(&str, &str); 3] = [
    ("comchain.json", include_str!("../patterns/comchain.json")),
    ("cyclos.json", include_str!("../patterns/cyclos.json")),
    ("kohinos.json", include_str!("../patterns/kohinos.json")),
];

/// Ordered set of format descriptors. Detection walks them in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    formats: Vec<FormatDescriptor>,
}

impl Catalog {
    /// Pattern files making up the base catalog, in catalog order.
    pub const FILE_NAMES: [&'static str; 3] = ["comchain.json", "cyclos.json", "kohinos.json"];

    pub fn new(formats: Vec<FormatDescriptor>) -> Self {
        warn_unreachable(&formats);
        Self { formats }
    }

    /// The base catalog compiled into the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        let docs = BUILTIN_PATTERNS
            .iter()
            .map(|(file, json)| PatternDocument::from_json(&format!("builtin:{file}"), json))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_documents(docs)
    }

    /// Reads the base catalog's pattern files from `dir`. All of them must exist.
    pub fn load_dir(dir: &Path) -> Result<Self, ConfigError> {
        let mut docs = Vec::with_capacity(Self::FILE_NAMES.len());
        for file in Self::FILE_NAMES {
            let path = dir.join(file);
            let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            docs.push(PatternDocument::from_json(&path.display().to_string(), &json)?);
        }
        Self::from_documents(docs)
    }

    pub fn from_documents(docs: Vec<PatternDocument>) -> Result<Self, ConfigError> {
        let formats = docs
            .into_iter()
            .map(FormatDescriptor::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(formats))
    }

    pub fn formats(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    pub fn get(&self, name: &str) -> Option<&FormatDescriptor> {
        self.formats.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// First descriptor whose expected raw columns are all present in `header`.
    pub fn detect(&self, header: &[String]) -> Option<&FormatDescriptor> {
        detect::detect(header, &self.formats)
    }
}

/// A descriptor is unreachable when an earlier one expects a subset of its columns.
fn warn_unreachable(formats: &[FormatDescriptor]) {
    let expected: Vec<HashSet<&str>> = formats
        .iter()
        .map(|f| f.field_mapping.raw_columns().collect())
        .collect();
    for (later, later_cols) in expected.iter().enumerate() {
        if let Some(earlier) = expected[..later].iter().position(|cols| cols.is_subset(later_cols)) {
            tracing::warn!(
                shadowed = %formats[later].name,
                by = %formats[earlier].name,
                "format can never be detected"
            );
        }
    }
}
