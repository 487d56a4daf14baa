//! Typed registry handles.
//!
//! A handle is the index of a resource in its registry array. The resource
//! type is carried as a phantom parameter so a material index can never be
//! passed where a texture index is expected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The absent / unassigned handle.
    pub const NONE: Self = Self::from_raw(u32::MAX);

    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.index
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.index == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }

    /// `None` for the absent handle.
    #[inline]
    #[must_use]
    pub const fn get(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::NONE
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = std::any::type_name::<T>().rsplit("::").next().unwrap_or("?");
        if self.is_none() {
            write!(f, "Handle<{kind}>(none)")
        } else {
            write!(f, "Handle<{kind}>({})", self.index)
        }
    }
}
