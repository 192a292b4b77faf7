//! # Store — Named Sprite Sheets Behind Stable Handles
//!
//! Sprites refer to their sheet through a [`SheetHandle`], a lightweight
//! `Copy` index into the [`SheetStore`]. The store owns every sheet's
//! validated descriptor together with whatever resources the caller attaches
//! to it (GPU textures in practice, `()` in tests).
//!
//! ```text
//! SheetStore<T>
//! ┌───────────────────────────────────────────────┐
//! │ sheets: Vec<Sheet<T>>                         │
//! │   [0] "trees"   desc + textures               │
//! │   [1] "rocks"   desc + textures               │
//! │                                               │
//! │ by_name: HashMap<String, SheetHandle>         │
//! │   "trees" → Handle(0)                         │
//! │   "rocks" → Handle(1)                         │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Sheets are immutable once inserted and live as long as the store, so a
//! handle never dangles or changes meaning.

use std::collections::HashMap;

use crate::error::{Result, SpriteError};
use crate::sheet::ValidSheet;

/// Handle to a sheet in a [`SheetStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetHandle(pub(crate) usize);

impl SheetHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A validated descriptor plus the resources drawn with it.
#[derive(Debug)]
pub struct Sheet<T> {
    pub desc: ValidSheet,
    pub textures: T,
}

/// Registry of sprite sheets, addressable by name or handle.
#[derive(Debug)]
pub struct SheetStore<T> {
    sheets: Vec<Sheet<T>>,
    by_name: HashMap<String, SheetHandle>,
}

impl<T> SheetStore<T> {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a sheet under its descriptor's name.
    ///
    /// A second sheet with an already-registered name is rejected and the
    /// store is left unchanged.
    pub fn insert(&mut self, desc: ValidSheet, textures: T) -> Result<SheetHandle> {
        if self.by_name.contains_key(&desc.name) {
            log::warn!("Ignoring additional sprite sheet named '{}'", desc.name);
            return Err(SpriteError::DuplicateSheet(desc.name.clone()));
        }

        let handle = SheetHandle(self.sheets.len());
        log::debug!("Registered sprite sheet '{}' as {:?}", desc.name, handle);
        self.by_name.insert(desc.name.clone(), handle);
        self.sheets.push(Sheet { desc, textures });
        Ok(handle)
    }

    pub fn handle(&self, name: &str) -> Option<SheetHandle> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, handle: SheetHandle) -> Option<&Sheet<T>> {
        self.sheets.get(handle.0)
    }

    /// Like [`get`](Self::get), but an unknown handle is an error.
    pub fn try_get(&self, handle: SheetHandle) -> Result<&Sheet<T>> {
        self.get(handle).ok_or(SpriteError::UnknownSheet(handle.0))
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SheetHandle, &Sheet<T>)> {
        self.sheets
            .iter()
            .enumerate()
            .map(|(i, sheet)| (SheetHandle(i), sheet))
    }
}

impl<T> Default for SheetStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
