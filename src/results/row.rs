use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::flags::Keying;
use crate::types::RowValues;

/// Column names of one rowset plus a name → index lookup, shared by every row of it.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    names: Arc<Vec<String>>,
    index: Arc<HashMap<String, usize>>,
}

impl ColumnSet {
    /// Build the lookup once per rowset. A repeated name resolves to its last column.
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect::<HashMap<_, _>>();
        Self {
            names: Arc::new(names),
            index: Arc::new(index),
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// A row from a database query result
///
/// Rows are produced fresh per fetch and owned by the caller. The [`Keying`] the row was
/// fetched with decides which accessors answer: keyed rows answer [`Row::get`], positional
/// rows answer [`Row::get_by_index`], rows fetched with [`Keying::Both`] answer either.
#[derive(Debug, Clone)]
pub struct Row {
    columns: ColumnSet,
    values: Vec<RowValues>,
    keying: Keying,
}

impl Row {
    #[must_use]
    pub fn new(columns: ColumnSet, values: Vec<RowValues>, keying: Keying) -> Self {
        Self {
            columns,
            values,
            keying,
        }
    }

    /// Get a value from the row by column name
    ///
    /// # Returns
    ///
    /// The value at the column, or `None` if the column wasn't found or the row is positional
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        if !self.keying.keyed() {
            return None;
        }
        self.columns
            .position(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    ///
    /// # Returns
    ///
    /// The value at the index, or `None` if the index is out of bounds or the row is keyed only
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        if !self.keying.positional() {
            return None;
        }
        self.values.get(index)
    }

    #[must_use]
    pub fn keying(&self) -> Keying {
        self.keying
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// All values in column order, regardless of keying.
    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<RowValues> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // Keyed serialization emits a repeated name once, at its last column.
    fn keyed_entries(&self) -> impl Iterator<Item = (usize, &String)> {
        self.columns
            .names()
            .iter()
            .enumerate()
            .filter(|(i, name)| self.columns.position(name) == Some(*i))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.keying {
            Keying::Positional => {
                let mut seq = serializer.serialize_seq(Some(self.values.len()))?;
                for value in &self.values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Keying::Keyed => {
                let mut map = serializer.serialize_map(None)?;
                for (i, name) in self.keyed_entries() {
                    map.serialize_entry(name, &self.values[i])?;
                }
                map.end()
            }
            Keying::Both => {
                let mut map = serializer.serialize_map(None)?;
                for (i, value) in self.values.iter().enumerate() {
                    map.serialize_entry(&i.to_string(), value)?;
                    if let Some(name) = self.columns.names().get(i)
                        && self.columns.position(name) == Some(i)
                    {
                        map.serialize_entry(name, value)?;
                    }
                }
                map.end()
            }
        }
    }
}
