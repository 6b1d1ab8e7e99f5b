//! Typed "not found" sentinels.
//!
//! Lookups never fail for a missing key. Instead every scalar kind has a
//! sentinel value: an accessor returns it when it has nothing for the key,
//! and the registry treats a value equal to the entry's sentinel as "this
//! entry does not define the key" and moves on to the next entry.

use serde::Deserialize;

use crate::accessor::Accessor;

/// Sentinel values for the five supported scalar kinds.
///
/// The default is each type's natural zero (`false`, `0`, `0`, `0.0`, `""`),
/// matching what accessors return for a missing key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NullValues {
    pub boolean: bool,
    pub int: i32,
    pub long: i64,
    pub double: f64,
    pub string: String,
}

impl Default for NullValues {
    fn default() -> Self {
        Self {
            boolean: false,
            int: 0,
            long: 0,
            double: 0.0,
            string: String::new(),
        }
    }
}

impl NullValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boolean(mut self, value: bool) -> Self {
        self.boolean = value;
        self
    }

    pub fn with_int(mut self, value: i32) -> Self {
        self.int = value;
        self
    }

    pub fn with_long(mut self, value: i64) -> Self {
        self.long = value;
        self
    }

    pub fn with_double(mut self, value: f64) -> Self {
        self.double = value;
        self
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.string = value.into();
        self
    }

    /// The sentinel for `T`.
    pub fn sentinel<T: Scalar>(&self) -> T {
        T::null_value(self)
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f64 {}
    impl Sealed for String {}
}

/// A scalar kind the registry can resolve.
///
/// Implemented for `bool`, `i32`, `i64`, `f64` and `String`; the set is closed.
pub trait Scalar: sealed::Sealed + Clone + PartialEq + std::fmt::Debug + Sized {
    /// The sentinel for this kind under `policy`.
    fn null_value(policy: &NullValues) -> Self;

    /// Read this kind from a document.
    fn read(accessor: &dyn Accessor, key: &str) -> Self;

    /// Whether `self` is the sentinel under `policy`.
    fn is_null(&self, policy: &NullValues) -> bool {
        *self == Self::null_value(policy)
    }
}

impl Scalar for bool {
    fn null_value(policy: &NullValues) -> Self {
        policy.boolean
    }

    fn read(accessor: &dyn Accessor, key: &str) -> Self {
        accessor.get_bool(key)
    }
}

impl Scalar for i32 {
    fn null_value(policy: &NullValues) -> Self {
        policy.int
    }

    fn read(accessor: &dyn Accessor, key: &str) -> Self {
        accessor.get_int(key)
    }
}

impl Scalar for i64 {
    fn null_value(policy: &NullValues) -> Self {
        policy.long
    }

    fn read(accessor: &dyn Accessor, key: &str) -> Self {
        accessor.get_long(key)
    }
}

impl Scalar for f64 {
    fn null_value(policy: &NullValues) -> Self {
        policy.double
    }

    fn read(accessor: &dyn Accessor, key: &str) -> Self {
        accessor.get_double(key)
    }

    // NaN != NaN, so a NaN sentinel would otherwise never match.
    fn is_null(&self, policy: &NullValues) -> bool {
        let sentinel = policy.double;
        *self == sentinel || (self.is_nan() && sentinel.is_nan())
    }
}

impl Scalar for String {
    fn null_value(policy: &NullValues) -> Self {
        policy.string.clone()
    }

    fn read(accessor: &dyn Accessor, key: &str) -> Self {
        accessor.get_string(key)
    }
}
