//! Typed storage bound to a declared option.
//!
//! Every option owns exactly one slot. The registry calls [`Slot::assign`]
//! for each occurrence and [`Slot::reset`] from `reset_all`; callers read the
//! result back through the handle returned at registration.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use crate::convert::{split_entry, FromArg};
use crate::error::ConversionError;

pub trait Slot: Any {
    /// Whether the option needs an argument. Options that don't are triggered
    /// with an empty string.
    fn takes_arg(&self) -> bool {
        true
    }

    /// Whether repeated occurrences accumulate.
    fn multiple(&self) -> bool {
        false
    }

    /// Type name for help output; empty for options without an argument.
    fn kind(&self) -> &'static str;

    /// Apply one occurrence. On failure the slot keeps its previous value.
    fn assign(&mut self, arg: &str) -> Result<(), ConversionError>;

    fn reset(&mut self);

    /// Make the current value the one `reset` restores.
    fn commit_default(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

/// A slot with a readable value.
pub trait Bound: Slot {
    type Output;

    fn output(&self) -> &Self::Output;
}

// ============================================================================
// Flag
// ============================================================================

/// Becomes `true` when the option is seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flag {
    set: bool,
    default: bool,
}

impl Flag {
    pub fn is_set(&self) -> bool {
        self.set
    }
}

impl Slot for Flag {
    fn takes_arg(&self) -> bool {
        false
    }

    fn kind(&self) -> &'static str {
        ""
    }

    fn assign(&mut self, _arg: &str) -> Result<(), ConversionError> {
        self.set = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.set = self.default;
    }

    fn commit_default(&mut self) {
        self.default = self.set;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Bound for Flag {
    type Output = bool;

    fn output(&self) -> &bool {
        &self.set
    }
}

// ============================================================================
// Scalar
// ============================================================================

/// Holds the last value given; starts out (and resets to) its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scalar<T> {
    value: T,
    default: T,
}

impl<T: Clone> Scalar<T> {
    pub fn new(default: T) -> Self {
        Scalar {
            value: default.clone(),
            default,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: FromArg + Clone + 'static> Slot for Scalar<T> {
    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn assign(&mut self, arg: &str) -> Result<(), ConversionError> {
        self.value = T::from_arg(arg)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.value = self.default.clone();
    }

    fn commit_default(&mut self) {
        self.default = self.value.clone();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: FromArg + Clone + 'static> Bound for Scalar<T> {
    type Output = T;

    fn output(&self) -> &T {
        &self.value
    }
}

// ============================================================================
// List
// ============================================================================

/// Appends one value per occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct List<T> {
    values: Vec<T>,
    default: Vec<T>,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        List {
            values: Vec::new(),
            default: Vec::new(),
        }
    }
}

impl<T> List<T> {
    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: FromArg + Clone + 'static> Slot for List<T> {
    fn multiple(&self) -> bool {
        true
    }

    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn assign(&mut self, arg: &str) -> Result<(), ConversionError> {
        self.values.push(T::from_arg(arg)?);
        Ok(())
    }

    fn reset(&mut self) {
        self.values.clone_from(&self.default);
    }

    fn commit_default(&mut self) {
        self.default.clone_from(&self.values);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: FromArg + Clone + 'static> Bound for List<T> {
    type Output = Vec<T>;

    fn output(&self) -> &Vec<T> {
        &self.values
    }
}

// ============================================================================
// Map
// ============================================================================

/// Collects `key:value` arguments; a repeated key keeps the last value.
#[derive(Debug, Clone, PartialEq)]
pub struct Map<T> {
    entries: BTreeMap<String, T>,
    default: BTreeMap<String, T>,
}

impl<T> Default for Map<T> {
    fn default() -> Self {
        Map {
            entries: BTreeMap::new(),
            default: BTreeMap::new(),
        }
    }
}

impl<T> Map<T> {
    pub fn entries(&self) -> &BTreeMap<String, T> {
        &self.entries
    }
}

impl<T: FromArg + Clone + 'static> Slot for Map<T> {
    fn multiple(&self) -> bool {
        true
    }

    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn assign(&mut self, arg: &str) -> Result<(), ConversionError> {
        let (key, raw) = split_entry(arg);
        let value = T::from_arg(raw)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn reset(&mut self) {
        self.entries.clone_from(&self.default);
    }

    fn commit_default(&mut self) {
        self.default.clone_from(&self.entries);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: FromArg + Clone + 'static> Bound for Map<T> {
    type Output = BTreeMap<String, T>;

    fn output(&self) -> &BTreeMap<String, T> {
        &self.entries
    }
}

// ============================================================================
// Functions
// ============================================================================

pub type TriggerFn = Box<dyn FnMut() -> Result<(), String>>;
pub type CallbackFn = Box<dyn FnMut(&str) -> Result<(), String>>;

/// Runs a closure for every occurrence of an option without argument.
pub struct Trigger {
    action: TriggerFn,
}

impl Trigger {
    pub fn new<F>(action: F) -> Self
    where
        F: FnMut() -> Result<(), String> + 'static,
    {
        Trigger {
            action: Box::new(action),
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Trigger")
    }
}

impl Slot for Trigger {
    fn takes_arg(&self) -> bool {
        false
    }

    fn kind(&self) -> &'static str {
        ""
    }

    fn assign(&mut self, arg: &str) -> Result<(), ConversionError> {
        (self.action)().map_err(|reason| ConversionError::new(arg, reason))
    }

    fn reset(&mut self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Hands every argument of the option to a closure.
pub struct Callback {
    action: CallbackFn,
}

impl Callback {
    pub fn new<F>(action: F) -> Self
    where
        F: FnMut(&str) -> Result<(), String> + 'static,
    {
        Callback {
            action: Box::new(action),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

impl Slot for Callback {
    fn kind(&self) -> &'static str {
        "value"
    }

    fn assign(&mut self, arg: &str) -> Result<(), ConversionError> {
        (self.action)(arg).map_err(|reason| ConversionError::new(arg, reason))
    }

    fn reset(&mut self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn flag_sets_and_resets() {
        let mut flag = Flag::default();
        assert!(!flag.takes_arg());
        flag.assign("").unwrap();
        assert!(flag.is_set());
        flag.reset();
        assert!(!flag.is_set());
    }

    #[test]
    fn scalar_failed_assign_keeps_value() {
        let mut slot = Scalar::new(5i64);
        slot.assign("0x10").unwrap();
        assert_eq!(*slot.get(), 16);
        assert!(slot.assign("ten").is_err());
        assert_eq!(*slot.get(), 16);
        slot.reset();
        assert_eq!(*slot.get(), 5);
    }

    #[test]
    fn list_only_appends_on_success() {
        let mut slot = List::<u64>::default();
        slot.assign("1").unwrap();
        assert!(slot.assign("-2").is_err());
        slot.assign("0b11").unwrap();
        assert_eq!(slot.values(), [1, 3]);
        assert!(slot.multiple());
        slot.reset();
        assert!(slot.values().is_empty());
    }

    #[test]
    fn map_splits_entries() {
        let mut slot = Map::<i64>::default();
        slot.assign("x:1").unwrap();
        slot.assign("y:-2").unwrap();
        slot.assign("x:3").unwrap();
        assert!(slot.assign("z:nope").is_err());
        let want: BTreeMap<String, i64> = [("x".to_string(), 3), ("y".to_string(), -2)].into();
        assert_eq!(slot.entries(), &want);
    }

    #[test]
    fn committed_default_survives_reset() {
        let mut slot = List::<String>::default();
        slot.assign("base").unwrap();
        slot.commit_default();
        slot.assign("extra").unwrap();
        slot.reset();
        assert_eq!(slot.values(), ["base".to_string()]);
    }

    #[test]
    fn callback_reports_closure_error() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut slot = Callback::new(move |arg| {
            if arg.is_empty() {
                return Err("empty command".to_string());
            }
            sink.borrow_mut().push(arg.to_string());
            Ok(())
        });
        slot.assign("ls -alt").unwrap();
        let err = slot.assign("").unwrap_err();
        assert_eq!(err.reason, "empty command");
        assert_eq!(*seen.borrow(), ["ls -alt".to_string()]);
    }
}
