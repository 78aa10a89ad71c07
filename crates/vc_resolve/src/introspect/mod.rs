//! Compile-time generated type introspection.
//!
//! Rust has no runtime reflection, so the reflective backend works on tables
//! generated by macros:
//!
//! - [`derive::Introspect`] describes the fields of a struct and adds the
//!   field-literal constructor `""`.
//! - [`derive::introspect_methods`] on an inherent `impl` block describes its
//!   constructors, methods, getters and setters.
//!
//! The tables of every non-generic introspected type are collected without
//! any registration step when the `auto_register` feature is enabled,
//! see [`IntrospectionIndex::discover`].
//!
//! # Examples
//!
//! ```
//! use vc_resolve::derive::{Introspect, introspect_methods};
//! use vc_resolve::introspect::Introspect;
//! use vc_resolve::args::Arguments;
//!
//! #[derive(Introspect)]
//! #[introspect(methods)]
//! struct Account {
//!     #[introspect(readonly)]
//!     owner: String,
//!     balance: i64,
//! }
//!
//! #[introspect_methods]
//! impl Account {
//!     fn open(owner: String) -> Self {
//!         Self { owner, balance: 0 }
//!     }
//!
//!     fn deposit(&mut self, amount: i64) -> i64 {
//!         self.balance += amount;
//!         self.balance
//!     }
//!
//!     fn overdrawn(&self) -> bool {
//!         self.balance < 0
//!     }
//! }
//!
//! let info = Account::introspection();
//! assert!(info.field("owner").unwrap().is_readonly());
//! assert!(info.getter("overdrawn").is_some());
//!
//! let value = info.construct("open", Arguments::new().with(String::from("ann"))).unwrap();
//! let mut account = value.take::<Account>().ok().unwrap();
//!
//! let total = info.invoke(&mut account, "deposit", Arguments::new().with(5_i64)).unwrap();
//! assert_eq!(total.unwrap().take::<i64>().ok(), Some(5));
//! ```
//!
//! [`derive::Introspect`]: crate::derive::Introspect
//! [`derive::introspect_methods`]: crate::derive::introspect_methods

use core::any::{Any, TypeId};
use core::fmt;

use crate::key_map::TypeIdMap;
use crate::value::TypeTag;

// -----------------------------------------------------------------------------
// Modules

mod info;

// -----------------------------------------------------------------------------
// Exports

pub use info::{ConstructorInfo, FieldInfo, MethodCall, MethodInfo, TypeIntrospection};

// -----------------------------------------------------------------------------
// Introspect

/// A type with a generated [`TypeIntrospection`].
///
/// Implemented by `#[derive(Introspect)]`. Generic types are not supported.
pub trait Introspect: Any + Send + Sync {
    fn introspection() -> &'static TypeIntrospection;
}

/// A link-time registered introspection table.
///
/// Submitted by `#[derive(Introspect)]` when `auto_register` is enabled.
#[doc(hidden)]
pub struct IntrospectionEntry(pub fn() -> &'static TypeIntrospection);

#[cfg(feature = "auto_register")]
inventory::collect!(IntrospectionEntry);

// -----------------------------------------------------------------------------
// IntrospectionIndex

/// Introspection tables keyed by type.
///
/// The reflective backend serves exactly the types found here.
#[derive(Clone, Default)]
pub struct IntrospectionIndex {
    tables: TypeIdMap<&'static TypeIntrospection>,
}

impl IntrospectionIndex {
    /// An index without tables.
    #[inline]
    pub const fn new() -> Self {
        Self {
            tables: TypeIdMap::new(),
        }
    }

    /// Collects the tables of every non-generic type deriving [`Introspect`]
    /// in the final binary.
    ///
    /// Without the `auto_register` feature the index is empty.
    pub fn discover() -> Self {
        #[cfg_attr(not(feature = "auto_register"), expect(unused_mut))]
        let mut index = Self::new();

        #[cfg(feature = "auto_register")]
        for entry in inventory::iter::<IntrospectionEntry> {
            index.insert((entry.0)());
        }

        log::debug!("discovered {} introspected types", index.len());
        index
    }

    /// Adds the table of `T`.
    #[inline]
    pub fn with<T: Introspect>(mut self) -> Self {
        self.insert(T::introspection());
        self
    }

    #[inline]
    pub fn insert(&mut self, table: &'static TypeIntrospection) {
        self.tables.insert(table.tag().id(), table);
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&'static TypeIntrospection> {
        self.tables.get(&type_id).copied()
    }

    #[inline]
    pub fn get_tag(&self, tag: TypeTag) -> Option<&'static TypeIntrospection> {
        self.get(tag.id())
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.tables.contains(&type_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'static TypeIntrospection> + '_ {
        self.tables.values().copied()
    }
}

impl fmt::Debug for IntrospectionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|table| table.tag())).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
