//! FILENAME: persistence/src/lib.rs
//! Durable storage for the spreadsheet engine.
//!
//! Persists the key/value model the engine's store contract describes:
//! per sheet, an unordered map of canonical cell id to formula text.
//! Empty formulas are absent; no dependency information and no cached
//! values are written, because replaying the formulas reconstructs both.
//! The whole book lives in one JSON file that is rewritten on every
//! mutation; sheets are small and the ground facts are the only thing
//! worth being durable about.

mod error;

pub use error::PersistenceError;

use engine::{CellId, Store, StoreError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// On-disk shape of the whole book: sheet name to cell map, cell ids as
/// canonical text.
#[derive(Debug, Default, Serialize, Deserialize)]
struct BookData {
    sheets: HashMap<String, BTreeMap<String, String>>,
}

/// A JSON-file-backed store of `(sheet, cellId) -> formula`.
#[derive(Debug)]
pub struct SheetFile {
    path: PathBuf,
    book: BookData,
}

impl SheetFile {
    /// Opens (or prepares to create) the book at `path`. A missing file
    /// is an empty book; a malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let book = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BookData::default(),
            Err(err) => return Err(err.into()),
        };
        debug!(
            "opened book {:?} with {} sheet(s)",
            path,
            book.sheets.len()
        );
        Ok(SheetFile { path, book })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        let text = serde_json::to_string_pretty(&self.book)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl Store for SheetFile {
    fn read_formulas(&mut self, sheet: &str) -> Result<Vec<(CellId, String)>, StoreError> {
        let Some(cells) = self.book.sheets.get(sheet) else {
            return Ok(Vec::new());
        };
        let mut rows = Vec::with_capacity(cells.len());
        for (id_text, formula) in cells {
            let id: CellId = id_text
                .parse()
                .map_err(|_| PersistenceError::InvalidCellId(id_text.clone()))?;
            rows.push((id, formula.clone()));
        }
        Ok(rows)
    }

    fn update_cell(&mut self, sheet: &str, id: CellId, formula: &str) -> Result<(), StoreError> {
        self.book
            .sheets
            .entry(sheet.to_string())
            .or_default()
            .insert(id.to_string(), formula.to_string());
        self.flush()?;
        Ok(())
    }

    fn delete(&mut self, sheet: &str, id: CellId) -> Result<(), StoreError> {
        if let Some(cells) = self.book.sheets.get_mut(sheet) {
            cells.remove(&id.to_string());
            if cells.is_empty() {
                self.book.sheets.remove(sheet);
            }
            self.flush()?;
        }
        Ok(())
    }

    fn clear(&mut self, sheet: &str) -> Result<(), StoreError> {
        if self.book.sheets.remove(sheet).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.flush()?;
        Ok(())
    }
}
