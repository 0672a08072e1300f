//! Typed per-entity attribute store
//!
//! Processors communicate through attributes attached to cells, edges,
//! corners and chunks. A [`DataKey`] pairs an attribute name with the type of
//! its value, so reads and writes through the same key always agree on the
//! type.
//!
//! # Example
//!
//! ```
//! use voronoi_cellmap::data::{DataKey, DataMap};
//!
//! const HEAT: DataKey<f64> = DataKey::new("heat");
//!
//! let mut data = DataMap::new();
//! assert_eq!(data.set(HEAT, 0.5), None);
//! assert_eq!(data.get(HEAT), Some(&0.5));
//! assert!(data.require(DataKey::<bool>::new("missing")).is_err());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{CellMapError, Result};

/// Named key of an attribute holding a `T`
pub struct DataKey<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> DataKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for DataKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DataKey<T> {}

impl<T> fmt::Debug for DataKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataKey").field(&self.name).finish()
    }
}

/// Attribute values keyed by name
///
/// A value stored under a name with one type is invisible to a key of the same
/// name and a different type.
#[derive(Default)]
pub struct DataMap {
    values: HashMap<&'static str, Box<dyn Any>>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: 'static>(&self, key: DataKey<T>) -> Option<&T> {
        self.values.get(key.name).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self, key: DataKey<T>) -> Option<&mut T> {
        self.values.get_mut(key.name).and_then(|v| v.downcast_mut::<T>())
    }

    /// Like [`get`](Self::get), failing when the attribute is absent
    ///
    /// # Errors
    ///
    /// Returns `MissingAttribute` naming the key.
    pub fn require<T: 'static>(&self, key: DataKey<T>) -> Result<&T> {
        self.get(key).ok_or(CellMapError::MissingAttribute { key: key.name })
    }

    /// Store a value, returning the previous one of the same type
    pub fn set<T: 'static>(&mut self, key: DataKey<T>, value: T) -> Option<T> {
        self.values
            .insert(key.name, Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Take a value out; a value of another type under the same name stays
    pub fn remove<T: 'static>(&mut self, key: DataKey<T>) -> Option<T> {
        if !self.contains(key) {
            return None;
        }
        self.values
            .remove(key.name)
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn contains<T: 'static>(&self, key: DataKey<T>) -> bool {
        self.get(key).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for DataMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("DataMap").field("keys", &names).finish()
    }
}

/// An entity carrying a [`DataMap`]
pub trait DataHolder {
    fn data(&self) -> &DataMap;

    fn data_mut(&mut self) -> &mut DataMap;

    fn get<T: 'static>(&self, key: DataKey<T>) -> Option<&T> {
        self.data().get(key)
    }

    /// # Errors
    ///
    /// Returns `MissingAttribute` if the attribute is not set.
    fn require<T: 'static>(&self, key: DataKey<T>) -> Result<&T> {
        self.data().require(key)
    }

    fn set<T: 'static>(&mut self, key: DataKey<T>, value: T) -> Option<T> {
        self.data_mut().set(key, value)
    }

    fn remove<T: 'static>(&mut self, key: DataKey<T>) -> Option<T> {
        self.data_mut().remove(key)
    }

    fn contains<T: 'static>(&self, key: DataKey<T>) -> bool {
        self.data().contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT: DataKey<i32> = DataKey::new("count");
    const LABEL: DataKey<String> = DataKey::new("label");

    #[test]
    fn test_set_get_remove() {
        let mut data = DataMap::new();
        assert!(data.is_empty());
        assert_eq!(data.get(COUNT), None);

        assert_eq!(data.set(COUNT, 3), None);
        assert_eq!(data.set(COUNT, 4), Some(3));
        assert_eq!(data.get(COUNT), Some(&4));

        data.set(LABEL, "coast".to_string());
        assert_eq!(data.len(), 2);
        assert_eq!(data.get(LABEL).map(String::as_str), Some("coast"));

        assert_eq!(data.remove(COUNT), Some(4));
        assert!(!data.contains(COUNT));
        assert!(data.contains(LABEL));
    }

    #[test]
    fn test_get_mut() {
        let mut data = DataMap::new();
        data.set(COUNT, 1);
        *data.get_mut(COUNT).unwrap() += 10;
        assert_eq!(data.get(COUNT), Some(&11));
    }

    #[test]
    fn test_require_reports_key() {
        let data = DataMap::new();
        match data.require(COUNT) {
            Err(CellMapError::MissingAttribute { key }) => assert_eq!(key, "count"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_type_mismatch_is_absent() {
        let mut data = DataMap::new();
        data.set(COUNT, 7);
        let other: DataKey<f64> = DataKey::new("count");
        assert_eq!(data.get(other), None);
        assert!(!data.contains(other));

        assert_eq!(data.remove(other), None);
        assert_eq!(data.get(COUNT), Some(&7));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_debug_lists_keys() {
        let mut data = DataMap::new();
        data.set(LABEL, String::new());
        data.set(COUNT, 0);
        assert_eq!(format!("{:?}", data), r#"DataMap { keys: ["count", "label"] }"#);
        assert_eq!(format!("{:?}", COUNT), r#"DataKey("count")"#);
    }
}
