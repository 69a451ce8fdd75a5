//! Ordered, type-homogeneous collections of entities
//!
//! Elements are validated on the way in: building a collection from raw
//! records fails on the first record that cannot become an entity, and the
//! error carries that record's index together with its complete validation
//! details. Insertion order is preserved.

use serde_json::Value;

use super::{DtoOptions, Entity};
use crate::core::errors::{EntityError, EntityResult};
use crate::core::types::value_kind;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityCollection<T: Entity> {
    items: Vec<T>,
}

impl<T: Entity> Default for EntityCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from a JSON array of records
    pub fn from_dtos(value: Value) -> EntityResult<Self> {
        match value {
            Value::Array(dtos) => Self::from_dto_list(dtos),
            other => Err(EntityError::Serialization {
                message: format!(
                    "{} expects a list of records, got {}",
                    T::COLLECTION_NAME,
                    value_kind(&other)
                ),
            }),
        }
    }

    pub fn from_dto_list(dtos: Vec<Value>) -> EntityResult<Self> {
        let mut collection = Self::new();
        for dto in dtos {
            collection.push_dto(dto)?;
        }
        Ok(collection)
    }

    pub fn from_entities(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Validate a raw record and append it
    pub fn push_dto(&mut self, dto: Value) -> EntityResult<()> {
        let index = self.items.len();
        let entity = T::from_dto(dto).map_err(|source| EntityError::CollectionItem {
            entity: T::COLLECTION_NAME.to_string(),
            index,
            source: Box::new(source),
        })?;
        self.items.push(entity);
        Ok(())
    }

    pub fn push(&mut self, entity: T) {
        self.items.push(entity);
    }

    /// First element whose `field` equals `value`
    pub fn get_first(&self, field: &str, value: &Value) -> Option<&T> {
        self.items.iter().find(|item| item.get(field) == Some(value))
    }

    /// First element whose string `field` equals `value`
    pub fn get_first_str(&self, field: &str, value: &str) -> Option<&T> {
        self.items.iter().find(|item| item.get_str(field) == Some(value))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }

    pub fn to_dto(&self, options: &DtoOptions) -> Vec<Value> {
        self.items
            .iter()
            .map(|item| Value::Object(item.to_dto(options)))
            .collect()
    }

    pub fn to_value(&self, options: &DtoOptions) -> Value {
        Value::Array(self.to_dto(options))
    }
}

impl<'a, T: Entity> IntoIterator for &'a EntityCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Entity> IntoIterator for EntityCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
