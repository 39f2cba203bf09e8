//! The MetaDataCache - runtime class and field lookup.

use crate::error::{MetaDataError, MetaDataResult};
use crate::{ClassDef, FieldDef, FieldFilter};
use cellar_core::{Clid, Flid, PropertyType};
use regex_lite::Regex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::OnceLock;
use tracing::debug;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid"))
}

fn validate_name(name: &str) -> MetaDataResult<()> {
    if identifier_regex().is_match(name) {
        Ok(())
    } else {
        Err(MetaDataError::invalid_name(name))
    }
}

/// The MetaDataCache provides runtime lookup of class and field definitions.
///
/// Classes and fields are added once (from schema sources or direct calls)
/// and never change afterwards, except that virtual fields may be added at
/// any time. Not thread-safe.
#[derive(Debug, Clone, Default)]
pub struct MetaDataCache {
    /// Class definitions by ID.
    classes: HashMap<Clid, ClassDef>,
    /// Class ID lookup by name.
    class_names: HashMap<String, Clid>,
    /// Direct subclasses of each class, in registration order.
    subclasses: HashMap<Clid, Vec<Clid>>,
    /// The single class without a base.
    root: Option<Clid>,
    /// Next auto-assigned class ID.
    next_clid: u32,

    /// Field definitions by ID.
    fields: HashMap<Flid, FieldDef>,
    /// Own fields of each class, in registration order.
    fields_by_class: HashMap<Clid, Vec<Flid>>,
    /// Next conventional local index per class.
    next_local: HashMap<Clid, u32>,

    /// Names of schema sources merged so far.
    sources: HashSet<String>,
}

impl MetaDataCache {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Class Registration ====================

    /// Register a class, allocating the next free class ID.
    ///
    /// `base_name` is `None` only for the root class.
    pub fn add_class(
        &mut self,
        name: &str,
        is_abstract: bool,
        base_name: Option<&str>,
    ) -> MetaDataResult<Clid> {
        let clid = Clid::new(self.next_clid);
        self.add_class_with_id(clid, name, is_abstract, base_name)
    }

    /// Register a class under an explicit class ID.
    pub fn add_class_with_id(
        &mut self,
        clid: Clid,
        name: &str,
        is_abstract: bool,
        base_name: Option<&str>,
    ) -> MetaDataResult<Clid> {
        validate_name(name)?;
        if Flid::conventional(clid, 0).is_none() {
            return Err(MetaDataError::ClidOutOfRange(clid));
        }
        if self.class_names.contains_key(name) || self.classes.contains_key(&clid) {
            return Err(MetaDataError::duplicate_class(name));
        }

        let base_clid = match base_name {
            Some(base) => self.get_class_id(base)?,
            None => {
                if let Some(root) = self.root {
                    return Err(MetaDataError::MultipleRoots {
                        name: name.to_string(),
                        root: self.classes[&root].name.clone(),
                    });
                }
                self.root = Some(clid);
                clid
            }
        };

        if base_clid != clid {
            self.subclasses.entry(base_clid).or_default().push(clid);
        }
        self.classes
            .insert(clid, ClassDef::new(clid, name, is_abstract, base_clid));
        self.class_names.insert(name.to_string(), clid);
        self.next_clid = self.next_clid.max(clid.raw() + 1);

        debug!(%clid, name, is_abstract, base = %base_clid, "registered class");
        Ok(clid)
    }

    // ==================== Field Registration ====================

    /// Register a field on a class, allocating a conventional flid.
    ///
    /// `dest_class` is required for object-valued types and forbidden otherwise.
    pub fn add_field(
        &mut self,
        class_name: &str,
        field_name: &str,
        property_type: PropertyType,
        dest_class: Option<&str>,
    ) -> MetaDataResult<Flid> {
        let clid = self.get_class_id(class_name)?;
        let flid = self.next_conventional_flid(clid)?;
        self.add_field_with_id(flid, class_name, field_name, property_type, dest_class)
    }

    /// Register a field under an explicit flid.
    pub fn add_field_with_id(
        &mut self,
        flid: Flid,
        class_name: &str,
        field_name: &str,
        property_type: PropertyType,
        dest_class: Option<&str>,
    ) -> MetaDataResult<Flid> {
        let clid = self.get_class_id(class_name)?;
        validate_name(field_name)?;

        let dest_clid = match (property_type.is_object(), dest_class) {
            (true, Some(dest)) => Some(self.get_class_id(dest)?),
            (true, None) => {
                return Err(MetaDataError::MissingDestination {
                    class: class_name.to_string(),
                    field: field_name.to_string(),
                })
            }
            (false, Some(_)) => {
                return Err(MetaDataError::UnexpectedDestination {
                    class: class_name.to_string(),
                    field: field_name.to_string(),
                })
            }
            (false, None) => None,
        };

        let mut def = FieldDef::new(flid, field_name, clid, property_type);
        def.dest_clid = dest_clid;
        self.insert_field(def)?;
        Ok(flid)
    }

    /// Add a field at runtime.
    ///
    /// `type_ordinal` is the raw `PropertyType` code; codes outside the
    /// valid set are rejected with `InvalidType`.
    pub fn add_virtual_field(
        &mut self,
        class_name: &str,
        field_name: &str,
        flid: Flid,
        type_ordinal: i32,
    ) -> MetaDataResult<()> {
        let clid = self.get_class_id(class_name)?;
        if self.name_in_use(clid, field_name) {
            return Err(MetaDataError::duplicate_field(class_name, field_name));
        }
        if self.flid_in_use(flid) {
            return Err(MetaDataError::DuplicateFlid(flid));
        }
        let property_type =
            PropertyType::from_ordinal(type_ordinal).ok_or(MetaDataError::InvalidType(type_ordinal))?;
        validate_name(field_name)?;

        let def = FieldDef::new(flid, field_name, clid, property_type).virtual_field();
        self.insert_field(def)
    }

    fn insert_field(&mut self, def: FieldDef) -> MetaDataResult<()> {
        let class_name = self.classes[&def.owner_clid].name.clone();
        if self.name_in_use(def.owner_clid, &def.name) {
            return Err(MetaDataError::duplicate_field(class_name, def.name));
        }
        if self.flid_in_use(def.flid) {
            return Err(MetaDataError::DuplicateFlid(def.flid));
        }

        debug!(
            flid = %def.flid,
            class = %class_name,
            name = %def.name,
            ty = %def.property_type,
            is_virtual = def.is_virtual,
            "registered field"
        );
        self.fields_by_class
            .entry(def.owner_clid)
            .or_default()
            .push(def.flid);
        self.fields.insert(def.flid, def);
        Ok(())
    }

    fn flid_in_use(&self, flid: Flid) -> bool {
        flid.is_reserved() || self.fields.contains_key(&flid)
    }

    /// A name is taken if any ancestor (self included) or any descendant declares it.
    fn name_in_use(&self, clid: Clid, name: &str) -> bool {
        let declares = |c: Clid| {
            self.fields_by_class
                .get(&c)
                .into_iter()
                .flatten()
                .any(|f| self.fields[f].name == name)
        };
        self.ancestors(clid).into_iter().any(declares)
            || self.descendants(clid).into_iter().any(declares)
    }

    fn next_conventional_flid(&mut self, clid: Clid) -> MetaDataResult<Flid> {
        let local = self.next_local.entry(clid).or_insert(1);
        loop {
            let flid = Flid::conventional(clid, *local).ok_or(MetaDataError::NoFreeFlid(clid))?;
            *local += 1;
            if !flid.is_reserved() && !self.fields.contains_key(&flid) {
                return Ok(flid);
            }
        }
    }

    // ==================== Schema Sources ====================

    /// Check whether a schema source with this name was already merged.
    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains(name)
    }

    pub(crate) fn record_source(&mut self, name: &str) {
        self.sources.insert(name.to_string());
    }

    // ==================== Class Lookups ====================

    /// Get a class definition by ID.
    pub fn class(&self, clid: Clid) -> Option<&ClassDef> {
        self.classes.get(&clid)
    }

    /// Get a class definition by ID, failing with `UnknownClass`.
    pub fn class_def(&self, clid: Clid) -> MetaDataResult<&ClassDef> {
        self.classes
            .get(&clid)
            .ok_or_else(|| MetaDataError::unknown_class(clid.to_string()))
    }

    /// Get a class definition by name.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassDef> {
        self.class_names.get(name).and_then(|id| self.classes.get(id))
    }

    /// Get a class ID by name.
    pub fn get_class_id(&self, name: &str) -> MetaDataResult<Clid> {
        self.class_names
            .get(name)
            .copied()
            .ok_or_else(|| MetaDataError::unknown_class(name))
    }

    /// Get a class name by ID.
    pub fn get_class_name(&self, clid: Clid) -> MetaDataResult<&str> {
        Ok(&self.class_def(clid)?.name)
    }

    /// Check whether a class is abstract.
    pub fn get_abstract(&self, clid: Clid) -> MetaDataResult<bool> {
        Ok(self.class_def(clid)?.is_abstract)
    }

    /// Get the base class ID. Fails with `NoSuchBaseClass` for the root.
    pub fn get_base_cls_id(&self, clid: Clid) -> MetaDataResult<Clid> {
        let class = self.class_def(clid)?;
        if class.is_root() {
            return Err(MetaDataError::NoSuchBaseClass(clid));
        }
        Ok(class.base_clid)
    }

    /// Get the base class name. Fails with `NoSuchBaseClass` for the root.
    pub fn get_base_cls_name(&self, clid: Clid) -> MetaDataResult<&str> {
        let base = self.get_base_cls_id(clid)?;
        self.get_class_name(base)
    }

    /// The root of the class hierarchy, if any class is registered.
    pub fn root_class(&self) -> Option<Clid> {
        self.root
    }

    /// The class followed by its bases up to and including the root.
    pub fn ancestors(&self, clid: Clid) -> Vec<Clid> {
        let mut chain = Vec::new();
        let mut current = self.classes.get(&clid);
        while let Some(class) = current {
            chain.push(class.clid);
            if class.is_root() {
                break;
            }
            current = self.classes.get(&class.base_clid);
        }
        chain
    }

    /// All transitive subclasses, not including the class itself.
    fn descendants(&self, clid: Clid) -> Vec<Clid> {
        let mut result = Vec::new();
        let mut queue: VecDeque<Clid> = self
            .subclasses
            .get(&clid)
            .into_iter()
            .flatten()
            .copied()
            .collect();
        while let Some(next) = queue.pop_front() {
            result.push(next);
            if let Some(children) = self.subclasses.get(&next) {
                queue.extend(children.iter().copied());
            }
        }
        result
    }

    /// Direct subclasses, in registration order.
    pub fn get_direct_subclasses(&self, clid: Clid) -> MetaDataResult<Vec<Clid>> {
        self.class_def(clid)?;
        Ok(self.subclasses.get(&clid).cloned().unwrap_or_default())
    }

    /// The class itself followed by all of its transitive subclasses.
    pub fn get_all_subclasses(&self, clid: Clid) -> MetaDataResult<Vec<Clid>> {
        self.class_def(clid)?;
        let mut result = vec![clid];
        result.extend(self.descendants(clid));
        Ok(result)
    }

    /// Check if `clid` is `base` or derives from it.
    pub fn is_same_or_subclass_of(&self, clid: Clid, base: Clid) -> bool {
        self.ancestors(clid).contains(&base)
    }

    /// Get the number of classes.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Get all class IDs in ascending order.
    pub fn class_ids(&self) -> Vec<Clid> {
        let mut ids: Vec<Clid> = self.classes.keys().copied().collect();
        ids.sort();
        ids
    }

    // ==================== Field Lookups ====================

    /// Get a field definition by flid.
    pub fn field(&self, flid: Flid) -> Option<&FieldDef> {
        self.fields.get(&flid)
    }

    /// Get a field definition by flid, failing with `UnknownFlid`.
    pub fn field_def(&self, flid: Flid) -> MetaDataResult<&FieldDef> {
        self.fields.get(&flid).ok_or(MetaDataError::UnknownFlid(flid))
    }

    /// Look a field up by class and field name.
    ///
    /// Searches the class's own fields, then walks the base chain. A miss is
    /// `Ok(None)` unless `must_exist` is set.
    pub fn get_field_id(
        &self,
        class_name: &str,
        field_name: &str,
        must_exist: bool,
    ) -> MetaDataResult<Option<Flid>> {
        let clid = self.get_class_id(class_name)?;
        let found = self.find_field(clid, field_name, true);
        match found {
            None if must_exist => Err(MetaDataError::unknown_field(class_name, field_name)),
            other => Ok(other),
        }
    }

    /// Look a field up by class ID and field name.
    pub fn get_field_id2(
        &self,
        clid: Clid,
        field_name: &str,
        include_base_classes: bool,
    ) -> MetaDataResult<Option<Flid>> {
        self.class_def(clid)?;
        Ok(self.find_field(clid, field_name, include_base_classes))
    }

    fn find_field(&self, clid: Clid, field_name: &str, include_base_classes: bool) -> Option<Flid> {
        let chain = if include_base_classes {
            self.ancestors(clid)
        } else {
            vec![clid]
        };
        chain.into_iter().find_map(|c| {
            self.fields_by_class
                .get(&c)?
                .iter()
                .copied()
                .find(|f| self.fields[f].name == field_name)
        })
    }

    /// Get the fields of a class that pass `filter`.
    ///
    /// Own fields come first, then each base class's fields walking up.
    pub fn get_fields(
        &self,
        clid: Clid,
        include_superclasses: bool,
        filter: FieldFilter,
    ) -> MetaDataResult<Vec<Flid>> {
        self.class_def(clid)?;
        let chain = if include_superclasses {
            self.ancestors(clid)
        } else {
            vec![clid]
        };
        Ok(chain
            .into_iter()
            .flat_map(|c| self.fields_by_class.get(&c).into_iter().flatten())
            .copied()
            .filter(|f| filter.matches(&self.fields[f]))
            .collect())
    }

    /// Get the field name.
    pub fn get_field_name(&self, flid: Flid) -> MetaDataResult<&str> {
        Ok(&self.field_def(flid)?.name)
    }

    /// Get the field's property type.
    pub fn get_field_type(&self, flid: Flid) -> MetaDataResult<PropertyType> {
        Ok(self.field_def(flid)?.property_type)
    }

    /// Get the destination class of an object field.
    pub fn get_dst_cls_id(&self, flid: Flid) -> MetaDataResult<Option<Clid>> {
        Ok(self.field_def(flid)?.dest_clid)
    }

    /// Get the declaring class of a field.
    pub fn get_own_cls_id(&self, flid: Flid) -> MetaDataResult<Clid> {
        Ok(self.field_def(flid)?.owner_clid)
    }

    /// Get the declaring class name of a field.
    pub fn get_owner_class_name(&self, flid: Flid) -> MetaDataResult<&str> {
        let clid = self.get_own_cls_id(flid)?;
        self.get_class_name(clid)
    }

    /// Check whether a field was added at runtime.
    pub fn is_virtual(&self, flid: Flid) -> MetaDataResult<bool> {
        Ok(self.field_def(flid)?.is_virtual)
    }

    /// Check whether `flid` is declared on `clid` or one of its bases.
    pub fn is_field_of_class(&self, clid: Clid, flid: Flid) -> bool {
        self.fields
            .get(&flid)
            .map(|f| self.is_same_or_subclass_of(clid, f.owner_clid))
            .unwrap_or(false)
    }

    /// Get the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Get all flids in ascending order.
    pub fn field_ids(&self) -> Vec<Flid> {
        let mut ids: Vec<Flid> = self.fields.keys().copied().collect();
        ids.sort();
        ids
    }
}
