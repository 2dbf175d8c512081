//! Control values exchanged between controller and IPA modules

use crate::geometry::Rectangle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single control value
///
/// Controls are the tagged-union currency of the IPA protocol: exposure
/// times, gains, crop windows and the like all travel as `ControlValue`s
/// keyed by a numeric control ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlValue {
    /// No value (control present but unset)
    None,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    String(String),
    Rectangle(Rectangle),
    /// Homogeneous array of values
    Array(Vec<ControlValue>),
}

impl ControlValue {
    /// Checks whether the control carries no value
    pub fn is_none(&self) -> bool {
        matches!(self, ControlValue::None)
    }
}

impl From<bool> for ControlValue {
    fn from(v: bool) -> Self {
        ControlValue::Bool(v)
    }
}

impl From<i32> for ControlValue {
    fn from(v: i32) -> Self {
        ControlValue::Int32(v)
    }
}

impl From<i64> for ControlValue {
    fn from(v: i64) -> Self {
        ControlValue::Int64(v)
    }
}

impl From<f32> for ControlValue {
    fn from(v: f32) -> Self {
        ControlValue::Float(v)
    }
}

/// An ordered collection of controls keyed by control ID
///
/// Iteration order is the key order, so two lists with the same contents
/// serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlList {
    controls: BTreeMap<u32, ControlValue>,
}

impl ControlList {
    /// Creates an empty control list
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a control value
    pub fn set(&mut self, id: u32, value: impl Into<ControlValue>) {
        self.controls.insert(id, value.into());
    }

    /// Returns a control value, if present
    pub fn get(&self, id: u32) -> Option<&ControlValue> {
        self.controls.get(&id)
    }

    /// Checks whether a control is present
    pub fn contains(&self, id: u32) -> bool {
        self.controls.contains_key(&id)
    }

    /// Returns the number of controls
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Checks whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Iterates over (id, value) pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&u32, &ControlValue)> {
        self.controls.iter()
    }

    /// Merges another list into this one, overwriting duplicates
    pub fn merge(&mut self, other: &ControlList) {
        for (id, value) in other.iter() {
            self.controls.insert(*id, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_list_set_get() {
        let mut list = ControlList::new();
        list.set(1, 42i32);
        list.set(2, true);

        assert_eq!(list.get(1), Some(&ControlValue::Int32(42)));
        assert_eq!(list.get(2), Some(&ControlValue::Bool(true)));
        assert_eq!(list.get(3), None);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_control_list_overwrite() {
        let mut list = ControlList::new();
        list.set(1, 1i32);
        list.set(1, 2i32);
        assert_eq!(list.get(1), Some(&ControlValue::Int32(2)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_control_list_merge() {
        let mut a = ControlList::new();
        a.set(1, 1i32);
        a.set(2, 2i32);

        let mut b = ControlList::new();
        b.set(2, 20i32);
        b.set(3, 3i32);

        a.merge(&b);
        assert_eq!(a.get(1), Some(&ControlValue::Int32(1)));
        assert_eq!(a.get(2), Some(&ControlValue::Int32(20)));
        assert_eq!(a.get(3), Some(&ControlValue::Int32(3)));
    }

    #[test]
    fn test_control_value_none() {
        assert!(ControlValue::None.is_none());
        assert!(!ControlValue::Bool(false).is_none());
    }

    #[test]
    fn test_control_value_rectangle() {
        let mut list = ControlList::new();
        list.set(7, ControlValue::Rectangle(Rectangle::new(0, 0, 64, 64)));
        assert!(matches!(list.get(7), Some(ControlValue::Rectangle(_))));
    }
}
