//! Language schema: the node kinds, tokens and fields a grammar can produce.
//!
//! Queries are validated against a schema at compile time. Schemas come from
//! a grammar's `node-types.json` or are assembled with [`SchemaBuilder`].

use crate::error::QueryError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default, Clone)]
struct KindInfo {
    fields: BTreeSet<String>,
    subtypes: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Schema {
    named: BTreeMap<String, KindInfo>,
    tokens: BTreeSet<String>,
    fields: BTreeSet<String>,
}

#[derive(Deserialize)]
struct NodeTypeEntry {
    #[serde(rename = "type")]
    kind: String,
    named: bool,
    #[serde(default)]
    fields: BTreeMap<String, FieldEntry>,
    #[serde(default)]
    subtypes: Vec<TypeRef>,
}

#[derive(Deserialize)]
struct FieldEntry {
    #[serde(default)]
    types: Vec<TypeRef>,
}

#[derive(Deserialize)]
struct TypeRef {
    #[serde(rename = "type")]
    kind: String,
    named: bool,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Load a schema from the `node-types.json` shipped with tree-sitter grammars.
    pub fn from_node_types(json: &str) -> Result<Self, QueryError> {
        let entries: Vec<NodeTypeEntry> =
            serde_json::from_str(json).map_err(|e| QueryError::Schema(e.to_string()))?;
        let mut builder = SchemaBuilder::default();
        for entry in entries {
            if !entry.named {
                builder.add_token(&entry.kind);
                continue;
            }
            let info = builder.schema.named.entry(entry.kind.clone()).or_default();
            info.subtypes.extend(entry.subtypes.iter().map(|t| t.kind.clone()));
            info.fields.extend(entry.fields.keys().cloned());
            builder.schema.fields.extend(entry.fields.keys().cloned());
            for t in entry.fields.values().flat_map(|f| &f.types).chain(&entry.subtypes) {
                builder.add_ref(t);
            }
        }
        Ok(builder.build())
    }

    pub fn has_named_kind(&self, kind: &str) -> bool {
        self.named.contains_key(kind)
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn is_supertype(&self, kind: &str) -> bool {
        self.named.get(kind).is_some_and(|info| !info.subtypes.is_empty())
    }

    /// Whether `field` can appear on nodes of `kind`. Supertypes accept a
    /// field when any of their concrete subtypes does.
    pub fn kind_has_field(&self, kind: &str, field: &str) -> bool {
        self.concrete_kinds(kind)
            .iter()
            .any(|k| self.named.get(k.as_str()).is_some_and(|info| info.fields.contains(field)))
    }

    /// Expand a supertype into its concrete kinds. A concrete kind maps to itself.
    pub fn concrete_kinds(&self, kind: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        let mut pending = vec![kind.to_string()];
        while let Some(k) = pending.pop() {
            if !seen.insert(k.clone()) {
                continue;
            }
            match self.named.get(&k) {
                Some(info) if !info.subtypes.is_empty() => {
                    pending.extend(info.subtypes.iter().rev().cloned());
                }
                _ => out.push(k),
            }
        }
        out
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declare a named kind and the fields it can carry.
    pub fn kind(mut self, kind: &str, fields: &[&str]) -> Self {
        let info = self.schema.named.entry(kind.to_string()).or_default();
        for field in fields {
            info.fields.insert(field.to_string());
            self.schema.fields.insert(field.to_string());
        }
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.add_token(token);
        self
    }

    pub fn tokens(mut self, tokens: &[&str]) -> Self {
        for token in tokens {
            self.add_token(token);
        }
        self
    }

    pub fn supertype(mut self, kind: &str, subtypes: &[&str]) -> Self {
        let info = self.schema.named.entry(kind.to_string()).or_default();
        info.subtypes.extend(subtypes.iter().map(|s| s.to_string()));
        for sub in subtypes {
            self.schema.named.entry(sub.to_string()).or_default();
        }
        self
    }

    pub fn build(mut self) -> Schema {
        self.schema.named.entry("ERROR".to_string()).or_default();
        self.schema
    }

    fn add_token(&mut self, token: &str) {
        self.schema.tokens.insert(token.to_string());
    }

    fn add_ref(&mut self, t: &TypeRef) {
        if t.named {
            self.schema.named.entry(t.kind.clone()).or_default();
        } else {
            self.add_token(&t.kind);
        }
    }
}
