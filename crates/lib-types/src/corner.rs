//! Process corners and per-corner storage.
//!
//! IBIS gives most buffer data three times: once for typical silicon and once
//! each for the slow (min) and fast (max) process/voltage/temperature extremes.
//! [`CornerMap`] holds one value per corner and can only be indexed with a
//! [`Corner`], so an out-of-range corner access cannot be written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use thiserror::Error;

/// Corner case selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Min,
    #[default]
    Typ,
    Max,
}

impl Corner {
    /// All corners in storage order.
    pub const ALL: [Corner; 3] = [Corner::Min, Corner::Typ, Corner::Max];

    /// Column order used by IBIS tables: typical, minimum, maximum.
    pub const COLUMN_ORDER: [Corner; 3] = [Corner::Typ, Corner::Min, Corner::Max];

    #[inline]
    fn slot(self) -> usize {
        match self {
            Corner::Min => 0,
            Corner::Typ => 1,
            Corner::Max => 2,
        }
    }

    /// Short lowercase name (`min`, `typ`, `max`).
    pub fn name(self) -> &'static str {
        match self {
            Corner::Min => "min",
            Corner::Typ => "typ",
            Corner::Max => "max",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a corner name is not one of `min`, `typ`, `max`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown corner: {0}")]
pub struct UnknownCorner(pub String);

impl FromStr for Corner {
    type Err = UnknownCorner;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" | "minimum" => Ok(Corner::Min),
            "typ" | "typical" => Ok(Corner::Typ),
            "max" | "maximum" => Ok(Corner::Max),
            _ => Err(UnknownCorner(s.to_string())),
        }
    }
}

/// One value per process corner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CornerMap<T> {
    slots: [T; 3],
}

impl<T> CornerMap<T> {
    /// Build from values listed in IBIS column order (typ, min, max).
    pub fn from_columns(typ: T, min: T, max: T) -> Self {
        Self {
            slots: [min, typ, max],
        }
    }

    /// Build by evaluating `f` once per corner.
    pub fn from_fn(mut f: impl FnMut(Corner) -> T) -> Self {
        Self {
            slots: Corner::ALL.map(&mut f),
        }
    }

    #[inline]
    pub fn get(&self, corner: Corner) -> &T {
        &self.slots[corner.slot()]
    }

    #[inline]
    pub fn get_mut(&mut self, corner: Corner) -> &mut T {
        &mut self.slots[corner.slot()]
    }

    /// Replace the value for `corner`, returning the previous one.
    pub fn set(&mut self, corner: Corner, value: T) -> T {
        std::mem::replace(self.get_mut(corner), value)
    }

    /// Iterate `(corner, value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Corner, &T)> {
        Corner::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Corner, &mut T)> {
        Corner::ALL.into_iter().zip(self.slots.iter_mut())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CornerMap<U> {
        CornerMap {
            slots: self.slots.map(f),
        }
    }
}

impl<T: Clone> CornerMap<T> {
    /// Same value at every corner.
    pub fn splat(value: T) -> Self {
        Self {
            slots: [value.clone(), value.clone(), value],
        }
    }
}

impl<T> Index<Corner> for CornerMap<T> {
    type Output = T;

    fn index(&self, corner: Corner) -> &T {
        self.get(corner)
    }
}

impl<T> IndexMut<Corner> for CornerMap<T> {
    fn index_mut(&mut self, corner: Corner) -> &mut T {
        self.get_mut(corner)
    }
}
