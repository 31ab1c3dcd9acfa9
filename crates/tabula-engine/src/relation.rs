//! Relation storage: row bodies keyed by primary key, plus a per-column
//! inverted index.
//!
//! Every non-key column maps each of its values to the bucket of primary
//! keys whose row holds that value; the primary-key map holds the full row
//! bodies. Equality probes and `IN` lists resolve through a bucket lookup,
//! while range and pattern predicates scan only the distinct values of a
//! column.

use std::collections::HashMap;

use indexmap::IndexMap;
use tabula_core::ast::{ColumnDef, DataType};

use crate::error::{EngineError, Result};
use crate::value::Value;

/// A foreign-key edge to a parent relation's primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// The referenced relation.
    pub parent_table: String,
    /// The referenced column (the parent's primary key).
    pub parent_column: String,
}

/// A reverse foreign-key edge, held by the parent. Drives cascading delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRef {
    /// The child relation.
    pub table: String,
    /// The child's FK column referencing this relation's primary key.
    pub column: String,
}

/// One table: schema, rows, and column indices.
#[derive(Debug, Clone)]
pub struct Relation {
    name: String,
    columns: Vec<ColumnDef>,
    positions: HashMap<String, usize>,
    primary_key: String,
    pk_position: usize,
    foreign_keys: HashMap<String, ForeignKey>,
    children: Vec<ChildRef>,
    /// Row bodies in declared column order, keyed by primary-key value.
    /// Insertion order is preserved so scans are deterministic.
    rows: IndexMap<Value, Vec<Value>>,
    /// Inverted index per non-key column: value -> bucket of primary keys.
    index: HashMap<String, IndexMap<Value, Vec<Value>>>,
}

impl Relation {
    /// Creates an empty relation.
    ///
    /// # Errors
    ///
    /// Returns a schema error for duplicate column names, a missing
    /// primary-key column, or an FK declared on an unknown column.
    pub fn new(
        name: String,
        columns: Vec<ColumnDef>,
        primary_key: String,
        foreign_keys: HashMap<String, ForeignKey>,
    ) -> Result<Self> {
        let mut positions = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if positions.insert(col.name.clone(), i).is_some() {
                return Err(EngineError::DuplicateColumn {
                    table: name,
                    column: col.name.clone(),
                });
            }
        }

        let Some(&pk_position) = positions.get(&primary_key) else {
            return Err(EngineError::UnknownColumn {
                table: name,
                column: primary_key,
            });
        };

        for fk_column in foreign_keys.keys() {
            if !positions.contains_key(fk_column) {
                return Err(EngineError::UnknownColumn {
                    table: name,
                    column: fk_column.clone(),
                });
            }
        }

        let index = columns
            .iter()
            .filter(|c| c.name != primary_key)
            .map(|c| (c.name.clone(), IndexMap::new()))
            .collect();

        Ok(Self {
            name,
            columns,
            positions,
            primary_key,
            pk_position,
            foreign_keys,
            children: Vec::new(),
            rows: IndexMap::new(),
            index,
        })
    }

    /// The relation's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// The primary-key column name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// The foreign-key map: local column -> parent edge.
    #[must_use]
    pub fn foreign_keys(&self) -> &HashMap<String, ForeignKey> {
        &self.foreign_keys
    }

    /// The reverse FK edges.
    #[must_use]
    pub fn children(&self) -> &[ChildRef] {
        &self.children
    }

    /// Number of rows, derived from the primary-key map.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the relation declares the column.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Returns true when `column` is the primary key.
    #[must_use]
    pub fn is_primary_key(&self, column: &str) -> bool {
        column == self.primary_key
    }

    /// The declared type of a column.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownColumn`] for an undeclared column.
    pub fn data_type(&self, column: &str) -> Result<DataType> {
        self.position(column)
            .map(|i| self.columns[i].data_type)
    }

    /// The position of a column in the declared order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownColumn`] for an undeclared column.
    pub fn position(&self, column: &str) -> Result<usize> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| EngineError::UnknownColumn {
                table: self.name.clone(),
                column: String::from(column),
            })
    }

    /// Returns true when a row with the given primary key exists.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.rows.contains_key(key)
    }

    /// The row body for a primary key, in declared column order.
    #[must_use]
    pub fn row(&self, key: &Value) -> Option<&[Value]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// One column's value of one row, through the row body.
    #[must_use]
    pub fn value_of(&self, key: &Value, column: &str) -> Option<&Value> {
        let position = *self.positions.get(column)?;
        self.rows.get(key).map(|row| &row[position])
    }

    /// The bucket of primary keys holding `value` in a non-key column.
    #[must_use]
    pub fn bucket(&self, column: &str, value: &Value) -> Option<&[Value]> {
        self.index
            .get(column)?
            .get(value)
            .map(Vec::as_slice)
    }

    /// Iterates the distinct values of a column, in first-insertion order.
    /// For the primary key these are the keys themselves.
    pub fn distinct_values<'a>(&'a self, column: &str) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
        if self.is_primary_key(column) {
            Box::new(self.rows.keys())
        } else {
            match self.index.get(column) {
                Some(buckets) => Box::new(buckets.keys()),
                None => Box::new(std::iter::empty()),
            }
        }
    }

    /// All primary-key values, in insertion order.
    #[must_use]
    pub fn all_keys(&self) -> Vec<Value> {
        self.rows.keys().cloned().collect()
    }

    /// Iterates `(key, row body)` pairs in insertion order.
    pub fn iter_rows(&self) -> impl Iterator<Item = (&Value, &[Value])> {
        self.rows.iter().map(|(k, row)| (k, row.as_slice()))
    }

    /// Registers a reverse FK edge. Called by the catalog when a child
    /// relation declares an FK into this relation.
    pub(crate) fn add_child(&mut self, child: ChildRef) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    /// Removes all reverse edges of a dropped child relation.
    pub(crate) fn remove_child(&mut self, table: &str) {
        self.children.retain(|c| c.table != table);
    }

    /// Inserts a pre-validated row in declared column order, maintaining the
    /// inverted indices. The caller has already checked arity, types, key
    /// uniqueness, and FK presence.
    pub(crate) fn insert_row(&mut self, row: Vec<Value>) {
        let key = row[self.pk_position].clone();
        for (i, col) in self.columns.iter().enumerate() {
            if i == self.pk_position {
                continue;
            }
            if let Some(buckets) = self.index.get_mut(&col.name) {
                buckets
                    .entry(row[i].clone())
                    .or_default()
                    .push(key.clone());
            }
        }
        self.rows.insert(key, row);
    }

    /// Removes a row's primary key from every non-key bucket, dropping
    /// buckets that become empty. The row body stays until
    /// [`Self::remove_body`].
    pub(crate) fn unindex_row(&mut self, key: &Value) {
        let Some(row) = self.rows.get(key) else {
            return;
        };
        let row = row.clone();
        for (i, col) in self.columns.iter().enumerate() {
            if i == self.pk_position {
                continue;
            }
            if let Some(buckets) = self.index.get_mut(&col.name) {
                if let Some(bucket) = buckets.get_mut(&row[i]) {
                    bucket.retain(|k| k != key);
                    if bucket.is_empty() {
                        buckets.shift_remove(&row[i]);
                    }
                }
            }
        }
    }

    /// Removes the primary-key entry itself. Insertion order of the
    /// surviving rows is preserved.
    pub(crate) fn remove_body(&mut self, key: &Value) {
        self.rows.shift_remove(key);
    }

    /// Rewrites one non-key column of one row: the key moves between
    /// buckets and the row body is overwritten.
    pub(crate) fn update_value(&mut self, key: &Value, column: &str, new: Value) {
        let Some(position) = self.positions.get(column).copied() else {
            return;
        };
        let Some(row) = self.rows.get_mut(key) else {
            return;
        };
        let old = std::mem::replace(&mut row[position], new.clone());

        if let Some(buckets) = self.index.get_mut(column) {
            if let Some(bucket) = buckets.get_mut(&old) {
                bucket.retain(|k| k != key);
                if bucket.is_empty() {
                    buckets.shift_remove(&old);
                }
            }
            buckets.entry(new).or_default().push(key.clone());
        }
    }
}
