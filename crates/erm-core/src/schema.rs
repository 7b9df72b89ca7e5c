//! Workspace schema types
//!
//! A schema declares which entity and edge types a workspace accepts and
//! which properties each type carries. Schemas are versioned; the version
//! is the optimistic-lock token for concurrent upserts.

use crate::ids::{SchemaId, WorkspaceId};
use crate::properties::{PropertyDef, PropertyType};
use crate::validation::valid_type_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declared entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeDef {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
}

/// Declared edge type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTypeDef {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
}

/// Validated schema body handed to the schema repository
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaDraft {
    pub entity_types: Vec<EntityTypeDef>,
    pub edge_types: Vec<EdgeTypeDef>,
    /// Expected stored version; `None` skips the optimistic-lock check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// A workspace's stored schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSchema {
    pub id: SchemaId,
    pub workspace_id: WorkspaceId,
    pub entity_types: Vec<EntityTypeDef>,
    pub edge_types: Vec<EdgeTypeDef>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceSchema {
    /// Build the first version of a schema from a validated draft
    pub fn from_draft(workspace_id: WorkspaceId, draft: SchemaDraft) -> Self {
        let now = Utc::now();
        Self {
            id: SchemaId::new(),
            workspace_id,
            entity_types: draft.entity_types,
            edge_types: draft.edge_types,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a draft on top of this schema, bumping the version
    pub fn apply(&mut self, draft: SchemaDraft) {
        self.entity_types = draft.entity_types;
        self.edge_types = draft.edge_types;
        self.version += 1;
        self.updated_at = Utc::now();
    }

    pub fn entity_type(&self, name: &str) -> Option<&EntityTypeDef> {
        self.entity_types.iter().find(|t| t.name == name)
    }

    pub fn edge_type(&self, name: &str) -> Option<&EdgeTypeDef> {
        self.edge_types.iter().find(|t| t.name == name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw input
// ─────────────────────────────────────────────────────────────────────────────

/// Property declaration as submitted, before its kind is checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInput {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyInput {
    pub fn new(name: impl Into<String>, property_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_type: property_type.into(),
            required: false,
            allowed_values: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Type declaration as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInput {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyInput>,
}

impl TypeInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyInput) -> Self {
        self.properties.push(property);
        self
    }
}

/// Schema body as submitted to `UpsertSchema`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaInput {
    #[serde(default)]
    pub entity_types: Vec<TypeInput>,
    #[serde(default)]
    pub edge_types: Vec<TypeInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl SchemaInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity_type(mut self, t: TypeInput) -> Self {
        self.entity_types.push(t);
        self
    }

    pub fn with_edge_type(mut self, t: TypeInput) -> Self {
        self.edge_types.push(t);
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Check the whole body and convert it into a draft
    ///
    /// All problems are reported, as plain messages, not just the first.
    pub fn into_draft(self) -> std::result::Result<SchemaDraft, Vec<String>> {
        let mut errors = Vec::new();

        let entity_types = check_types("entity", self.entity_types, &mut errors);
        let edge_types = check_types("edge", self.edge_types, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(SchemaDraft {
            entity_types: entity_types
                .into_iter()
                .map(|(name, properties)| EntityTypeDef { name, properties })
                .collect(),
            edge_types: edge_types
                .into_iter()
                .map(|(name, properties)| EdgeTypeDef { name, properties })
                .collect(),
            version: self.version,
        })
    }
}

fn check_types(
    kind: &str,
    types: Vec<TypeInput>,
    errors: &mut Vec<String>,
) -> Vec<(String, Vec<PropertyDef>)> {
    let mut seen = HashSet::new();
    let mut checked = Vec::with_capacity(types.len());

    for t in types {
        if !valid_type_name(&t.name) {
            errors.push(format!("invalid {} type name: {}", kind, t.name));
        }
        if !seen.insert(t.name.clone()) {
            errors.push(format!("duplicate {} type: {}", kind, t.name));
        }

        let mut prop_names = HashSet::new();
        let mut defs = Vec::with_capacity(t.properties.len());
        for p in t.properties {
            if !prop_names.insert(p.name.clone()) {
                errors.push(format!("duplicate property: {}.{}", t.name, p.name));
            }
            match PropertyType::parse(&p.property_type) {
                Some(property_type) => defs.push(PropertyDef {
                    name: p.name,
                    property_type,
                    required: p.required,
                    allowed_values: p.allowed_values,
                    description: p.description,
                }),
                None => errors.push(format!("invalid property type: {}", p.property_type)),
            }
        }

        checked.push((t.name, defs));
    }

    checked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> TypeInput {
        TypeInput::new("Person")
            .with_property(PropertyInput::new("name", "string").required())
            .with_property(PropertyInput::new("age", "integer"))
    }

    #[test]
    fn test_valid_input_becomes_draft() {
        let draft = SchemaInput::new()
            .with_entity_type(person())
            .with_edge_type(TypeInput::new("WORKS_AT"))
            .with_version(3)
            .into_draft()
            .unwrap();

        assert_eq!(draft.entity_types.len(), 1);
        assert_eq!(draft.entity_types[0].properties[0].property_type, PropertyType::String);
        assert!(draft.entity_types[0].properties[0].required);
        assert_eq!(draft.edge_types[0].name, "WORKS_AT");
        assert_eq!(draft.version, Some(3));
    }

    #[test]
    fn test_all_violations_reported() {
        let errors = SchemaInput::new()
            .with_entity_type(person())
            .with_entity_type(person())
            .with_entity_type(
                TypeInput::new("Company").with_property(PropertyInput::new("size", "invalid_type")),
            )
            .with_edge_type(TypeInput::new("123bad"))
            .into_draft()
            .unwrap_err();

        assert!(errors.contains(&"duplicate entity type: Person".to_string()));
        assert!(errors.contains(&"invalid property type: invalid_type".to_string()));
        assert!(errors.contains(&"invalid edge type name: 123bad".to_string()));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_duplicate_property_names() {
        let errors = SchemaInput::new()
            .with_entity_type(
                TypeInput::new("Person")
                    .with_property(PropertyInput::new("name", "string"))
                    .with_property(PropertyInput::new("name", "string")),
            )
            .into_draft()
            .unwrap_err();
        assert_eq!(errors, vec!["duplicate property: Person.name".to_string()]);
    }

    #[test]
    fn test_apply_bumps_version() {
        let ws = WorkspaceId::new();
        let draft = SchemaInput::new().with_entity_type(person()).into_draft().unwrap();
        let mut schema = WorkspaceSchema::from_draft(ws, draft.clone());
        assert_eq!(schema.version, 1);
        assert!(schema.entity_type("Person").is_some());
        assert!(schema.edge_type("Person").is_none());

        schema.apply(SchemaDraft::default());
        assert_eq!(schema.version, 2);
        assert!(schema.entity_type("Person").is_none());
    }
}
