//! Declarative schema sources.
//!
//! A `SchemaSource` is a named batch of class and field declarations that
//! can be written by hand, built fluently, or parsed from JSON. Sources are
//! merged into a `MetaDataCache` with `load_schema`, at most once each.

use crate::error::{MetaDataError, MetaDataResult};
use crate::MetaDataCache;
use cellar_core::{Clid, Flid, PropertyType};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A named set of class declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSource {
    pub name: String,
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
}

/// Declaration of one class and its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpec {
    /// Explicit class ID; allocated when absent.
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Base class name; absent only for the root.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Declaration of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Explicit flid; conventional numbering when absent.
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Destination class name for object fields.
    #[serde(default)]
    pub dest: Option<String>,
}

impl SchemaSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
        }
    }

    /// Parse a source from its JSON form.
    pub fn from_json(json: &str) -> MetaDataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Append a class declaration.
    pub fn class(mut self, class: ClassSpec) -> Self {
        self.classes.push(class);
        self
    }
}

impl ClassSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_abstract: false,
            base: None,
            fields: Vec::new(),
        }
    }

    pub fn with_id(mut self, clid: u32) -> Self {
        self.id = Some(clid);
        self
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            id: None,
            name: name.into(),
            property_type,
            dest: None,
        }
    }

    pub fn with_id(mut self, flid: u32) -> Self {
        self.id = Some(flid);
        self
    }

    pub fn dest(mut self, class: impl Into<String>) -> Self {
        self.dest = Some(class.into());
        self
    }
}

impl MetaDataCache {
    /// Merge a schema source.
    ///
    /// Classes may be declared in any order; bases are registered first.
    /// Fields are added once every class of the source exists, so object
    /// fields may point at classes declared later in the same source.
    /// On error the registry is left unchanged.
    pub fn load_schema(&mut self, source: &SchemaSource) -> MetaDataResult<()> {
        if self.has_source(&source.name) {
            return Err(MetaDataError::DuplicateSchemaSource {
                name: source.name.clone(),
            });
        }
        if source.classes.is_empty() {
            return Err(MetaDataError::EmptySchema {
                name: source.name.clone(),
            });
        }

        let mut staged = self.clone();
        let mut pending: Vec<&ClassSpec> = source.classes.iter().collect();
        while !pending.is_empty() {
            let (ready, blocked): (Vec<&ClassSpec>, Vec<&ClassSpec>) =
                pending.into_iter().partition(|c| match &c.base {
                    None => true,
                    Some(base) => staged.class_by_name(base).is_some(),
                });

            if ready.is_empty() {
                let missing = blocked
                    .iter()
                    .filter_map(|c| c.base.clone())
                    .find(|base| !blocked.iter().any(|c| &c.name == base))
                    .or_else(|| blocked.first().map(|c| c.name.clone()))
                    .unwrap_or_default();
                return Err(MetaDataError::unknown_class(missing));
            }

            for class in ready {
                let base = class.base.as_deref();
                match class.id {
                    Some(id) => {
                        staged.add_class_with_id(Clid::new(id), &class.name, class.is_abstract, base)?
                    }
                    None => staged.add_class(&class.name, class.is_abstract, base)?,
                };
            }
            pending = blocked;
        }

        for class in &source.classes {
            for field in &class.fields {
                let dest = field.dest.as_deref();
                match field.id {
                    Some(id) => staged.add_field_with_id(
                        Flid::new(id),
                        &class.name,
                        &field.name,
                        field.property_type,
                        dest,
                    )?,
                    None => staged.add_field(&class.name, &field.name, field.property_type, dest)?,
                };
            }
        }

        staged.record_source(&source.name);
        info!(
            source = %source.name,
            classes = staged.class_count() - self.class_count(),
            fields = staged.field_count() - self.field_count(),
            "loaded schema source"
        );
        *self = staged;
        Ok(())
    }
}
