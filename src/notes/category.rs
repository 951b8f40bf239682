//! Category registry: the property schema of each flowchart node category
//!
//! The registry is a static dispatch table keyed by [`Category`]. Adding a
//! category means adding a table entry. Every schema requires `Node Name`;
//! fields a schema does not declare are passed through untouched.

use super::error::{NoteError, NoteResult};
use super::models::{Category, Properties};
use serde_json::Value;

/// Property key holding a node's human-readable name
pub const NODE_NAME: &str = "Node Name";

/// Store property holding, as JSON text, the values Neo4j cannot keep natively
pub const EXTRA_PROPERTIES: &str = "_extra";

/// Internal bookkeeping keys that never appear in returned properties
pub const INTERNAL_KEYS: [&str; 3] = ["id", "experiment_id", EXTRA_PROPERTIES];

/// Accepted value shape of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string
    Text,
    /// A string (`"5 mL"`) or a bare number
    Quantity,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Quantity => value.is_string() || value.is_number(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(key: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        kind: FieldKind::Text,
        required: true,
    }
}

const fn optional(key: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        key,
        kind,
        required: false,
    }
}

/// Declared fields of one category
#[derive(Debug)]
pub struct PropertySchema {
    pub category: Category,
    pub fields: &'static [FieldSpec],
}

impl PropertySchema {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

static SCHEMAS: [PropertySchema; 4] = [
    PropertySchema {
        category: Category::Substances,
        fields: &[
            required(NODE_NAME),
            optional("Node Type", FieldKind::Text),
            optional("CAS RN", FieldKind::Text),
            optional("SMILES", FieldKind::Text),
            optional("Weight", FieldKind::Quantity),
            optional("Volume", FieldKind::Quantity),
            optional("Note", FieldKind::Text),
        ],
    },
    PropertySchema {
        category: Category::Processing,
        fields: &[required(NODE_NAME), optional("Note", FieldKind::Text)],
    },
    PropertySchema {
        category: Category::Measurement,
        fields: &[required(NODE_NAME), optional("Note", FieldKind::Text)],
    },
    PropertySchema {
        category: Category::Others,
        fields: &[required(NODE_NAME), optional("Note", FieldKind::Text)],
    },
];

/// Stateless lookup and shaping of category schemas
pub struct CategoryRegistry;

impl CategoryRegistry {
    /// Resolve a category tag supplied by a client
    pub fn resolve(tag: &str) -> NoteResult<Category> {
        tag.parse::<Category>().map_err(NoteError::Validation)
    }

    pub fn schema_for(category: Category) -> &'static PropertySchema {
        // SCHEMAS is ordered like Category::ALL
        &SCHEMAS[category as usize]
    }

    /// Validate and shape properties for writing.
    ///
    /// Required fields must be non-blank strings, declared fields must have
    /// their declared kind, `null` values are dropped and undeclared fields
    /// are kept verbatim. Internal keys may not be set by clients.
    pub fn shape(category: Category, raw: &Properties) -> NoteResult<Properties> {
        let schema = Self::schema_for(category);

        for spec in schema.required_fields() {
            match raw.get(spec.key) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(Value::Null) | None => {
                    return Err(NoteError::validation(format!(
                        "{} node is missing required property '{}'",
                        category, spec.key
                    )))
                }
                Some(_) => {
                    return Err(NoteError::validation(format!(
                        "{} property '{}' must be a non-empty string",
                        category, spec.key
                    )))
                }
            }
        }

        let mut shaped = Properties::new();
        for (key, value) in raw {
            if INTERNAL_KEYS.contains(&key.as_str()) {
                return Err(NoteError::validation(format!(
                    "property '{}' is reserved",
                    key
                )));
            }
            if value.is_null() {
                continue;
            }
            if let Some(spec) = schema.field(key) {
                if !spec.kind.accepts(value) {
                    return Err(NoteError::validation(format!(
                        "{} property '{}' has the wrong type (expected {:?})",
                        category, key, spec.kind
                    )));
                }
            }
            shaped.insert(key.clone(), value.clone());
        }

        Ok(shaped)
    }

    /// Shape stored properties for display. Never fails: internal keys are
    /// stripped and schema violations in stored data are only logged.
    pub fn shape_for_display(category: Category, stored: &Properties) -> Properties {
        let schema = Self::schema_for(category);

        for spec in schema.required_fields() {
            if !stored.contains_key(spec.key) {
                tracing::warn!(
                    category = %category,
                    field = spec.key,
                    "Stored node is missing a required property"
                );
            }
        }

        stored
            .iter()
            .filter(|(key, value)| !INTERNAL_KEYS.contains(&key.as_str()) && !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
