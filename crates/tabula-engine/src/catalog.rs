//! The catalog: process-wide registry of relations and the FK graph.

use std::collections::HashMap;

use indexmap::IndexMap;
use tabula_core::ast::{CreateTable, Literal};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::relation::{ChildRef, ForeignKey, Relation};
use crate::value::Value;

/// Registry mapping relation name to its [`Relation`], owning the FK
/// back-reference graph. Every operation that touches a second relation
/// (FK checks, cascades) goes through the catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: IndexMap<String, Relation>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a relation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownTable`] when the name is not registered.
    pub fn get(&self, name: &str) -> Result<&Relation> {
        self.tables
            .get(name)
            .ok_or_else(|| EngineError::UnknownTable(String::from(name)))
    }

    /// Returns true when the relation is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Iterates relation names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Relation> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownTable(String::from(name)))
    }

    /// Registers a new relation from a `CREATE TABLE` command.
    ///
    /// Foreign keys must reference the primary key of an already-registered
    /// relation, which keeps the FK graph acyclic by construction.
    ///
    /// # Errors
    ///
    /// Returns a schema error for a duplicate table name, an unknown
    /// referenced table or column, or an FK not targeting the parent's
    /// primary key.
    pub fn create_table(&mut self, def: CreateTable) -> Result<()> {
        if self.contains(&def.name) {
            return Err(EngineError::DuplicateTable(def.name));
        }

        let mut foreign_keys = HashMap::new();
        for fk in &def.foreign_keys {
            let parent = self.get(&fk.parent_table)?;
            if !parent.has_column(&fk.parent_column) {
                return Err(EngineError::UnknownColumn {
                    table: fk.parent_table.clone(),
                    column: fk.parent_column.clone(),
                });
            }
            if !parent.is_primary_key(&fk.parent_column) {
                return Err(EngineError::ForeignKeyTarget {
                    column: fk.column.clone(),
                    parent: fk.parent_table.clone(),
                });
            }
            foreign_keys.insert(
                fk.column.clone(),
                ForeignKey {
                    parent_table: fk.parent_table.clone(),
                    parent_column: fk.parent_column.clone(),
                },
            );
        }

        let relation = Relation::new(
            def.name.clone(),
            def.columns,
            def.primary_key,
            foreign_keys,
        )?;

        for fk in &def.foreign_keys {
            self.get_mut(&fk.parent_table)?.add_child(ChildRef {
                table: def.name.clone(),
                column: fk.column.clone(),
            });
        }

        debug!(table = %def.name, "created table");
        self.tables.insert(def.name, relation);
        Ok(())
    }

    /// Drops a relation, cascading through child relations first, then
    /// removing the registry entry and any reverse edges held by parents.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownTable`] when the name is not registered.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let children: Vec<String> = self
            .get(name)?
            .children()
            .iter()
            .map(|c| c.table.clone())
            .collect();

        for child in children {
            // A child may already be gone when two FK paths reach it.
            if self.contains(&child) {
                self.drop_table(&child)?;
            }
        }

        let relation = match self.tables.shift_remove(name) {
            Some(r) => r,
            None => return Err(EngineError::UnknownTable(String::from(name))),
        };
        for fk in relation.foreign_keys().values() {
            if let Some(parent) = self.tables.get_mut(&fk.parent_table) {
                parent.remove_child(name);
            }
        }

        debug!(table = name, "dropped table");
        Ok(())
    }

    /// Inserts one row given named columns and literal values.
    ///
    /// Validation happens entirely before any mutation, so a failed insert
    /// leaves no partial row: arity, column existence, type conversion,
    /// key uniqueness, and FK presence are all checked first.
    ///
    /// # Errors
    ///
    /// Returns a constraint error for an arity mismatch, an unconvertible
    /// value, a duplicate primary key, or an FK value absent from its
    /// parent relation.
    pub fn insert(&mut self, table: &str, columns: &[String], values: &[Literal]) -> Result<()> {
        let relation = self.get(table)?;

        if columns.len() != values.len() || columns.len() != relation.columns().len() {
            return Err(EngineError::ArityMismatch {
                table: String::from(table),
                got: values.len(),
                want: relation.columns().len(),
            });
        }

        // Reorder the named values into declared column order, converting
        // each to its column's type.
        let mut row: Vec<Option<Value>> = vec![None; relation.columns().len()];
        for (column, literal) in columns.iter().zip(values) {
            let position = relation.position(column)?;
            let value = Value::from_literal(literal, relation.columns()[position].data_type)?;
            if row[position].replace(value).is_some() {
                return Err(EngineError::DuplicateColumn {
                    table: String::from(table),
                    column: column.clone(),
                });
            }
        }
        let Some(row) = row.into_iter().collect::<Option<Vec<Value>>>() else {
            return Err(EngineError::ArityMismatch {
                table: String::from(table),
                got: values.len(),
                want: relation.columns().len(),
            });
        };

        let pk_position = relation.position(relation.primary_key())?;
        let key = &row[pk_position];
        if relation.contains_key(key) {
            return Err(EngineError::DuplicateKey {
                table: String::from(table),
                value: key.clone(),
            });
        }

        for (fk_column, fk) in relation.foreign_keys() {
            let position = relation.position(fk_column)?;
            let value = &row[position];
            let parent = self.get(&fk.parent_table)?;
            if !parent.contains_key(value) {
                return Err(EngineError::ForeignKeyViolation {
                    value: value.clone(),
                    parent: fk.parent_table.clone(),
                    parent_column: fk.parent_column.clone(),
                });
            }
        }

        self.get_mut(table)?.insert_row(row);
        Ok(())
    }

    /// Deletes the rows with the given primary keys, cascading through FK
    /// children: each removed key first leaves every non-key bucket, then
    /// child rows referencing it are deleted recursively, then the key's
    /// own entry goes.
    ///
    /// Returns the number of rows removed across all relations touched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownTable`] when the name is not registered.
    pub fn delete_keys(&mut self, table: &str, keys: &[Value]) -> Result<usize> {
        let children: Vec<ChildRef> = self.get(table)?.children().to_vec();
        let mut removed = 0;

        for key in keys {
            if !self.get(table)?.contains_key(key) {
                continue;
            }
            self.get_mut(table)?.unindex_row(key);

            for child in &children {
                let child_rel = self.get(&child.table)?;
                // An FK column that doubles as the child's primary key has
                // no inverted index; the key is its own bucket.
                let child_keys: Vec<Value> = if child_rel.is_primary_key(&child.column) {
                    if child_rel.contains_key(key) {
                        vec![key.clone()]
                    } else {
                        Vec::new()
                    }
                } else {
                    child_rel
                        .bucket(&child.column, key)
                        .map(<[Value]>::to_vec)
                        .unwrap_or_default()
                };
                removed += self.delete_keys(&child.table, &child_keys)?;
            }

            self.get_mut(table)?.remove_body(key);
            removed += 1;
        }

        Ok(removed)
    }

    /// Applies `SET` assignments to the rows with the given primary keys.
    ///
    /// Every assignment is validated before any row changes: the key
    /// column cannot be assigned, values convert to the column type, and
    /// an assigned FK column must receive a value present in its parent.
    ///
    /// Returns the number of rows rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PrimaryKeyAssignment`] for an assignment to
    /// the key column, a conversion error for an ill-typed value, or
    /// [`EngineError::ForeignKeyViolation`] for an FK value absent from
    /// the parent relation.
    pub fn update_keys(
        &mut self,
        table: &str,
        assignments: &[(String, Literal)],
        keys: &[Value],
    ) -> Result<usize> {
        let relation = self.get(table)?;

        let mut converted = Vec::with_capacity(assignments.len());
        for (column, literal) in assignments {
            if relation.is_primary_key(column) {
                return Err(EngineError::PrimaryKeyAssignment {
                    table: String::from(table),
                    column: column.clone(),
                });
            }
            let data_type = relation.data_type(column)?;
            let value = Value::from_literal(literal, data_type)?;
            if let Some(fk) = relation.foreign_keys().get(column) {
                let parent = self.get(&fk.parent_table)?;
                if !parent.contains_key(&value) {
                    return Err(EngineError::ForeignKeyViolation {
                        value,
                        parent: fk.parent_table.clone(),
                        parent_column: fk.parent_column.clone(),
                    });
                }
            }
            converted.push((column.clone(), value));
        }

        let relation = self.get_mut(table)?;
        for key in keys {
            for (column, value) in &converted {
                relation.update_value(key, column, value.clone());
            }
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::ast::{ColumnDef, DataType, ForeignKeyDef};

    fn create(name: &str, pk: &str, cols: &[(&str, DataType)], fks: &[(&str, &str)]) -> CreateTable {
        CreateTable {
            name: String::from(name),
            columns: cols
                .iter()
                .map(|(n, t)| ColumnDef {
                    name: String::from(*n),
                    data_type: *t,
                })
                .collect(),
            primary_key: String::from(pk),
            foreign_keys: fks
                .iter()
                .map(|(col, parent)| ForeignKeyDef {
                    column: String::from(*col),
                    parent_table: String::from(*parent),
                    parent_column: String::from(pk),
                })
                .collect(),
        }
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(create("t", "k", &[("k", DataType::Int)], &[]))
            .unwrap();
        let result = catalog.create_table(create("t", "k", &[("k", DataType::Int)], &[]));
        assert!(matches!(result, Err(EngineError::DuplicateTable(_))));
    }

    #[test]
    fn test_fk_to_missing_table_rejected() {
        let mut catalog = Catalog::new();
        let result =
            catalog.create_table(create("c", "k", &[("k", DataType::Int)], &[("k", "ghost")]));
        assert!(matches!(result, Err(EngineError::UnknownTable(_))));
    }

    #[test]
    fn test_insert_validates_before_mutating() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(create(
                "t",
                "k",
                &[("k", DataType::Int), ("v", DataType::Int)],
                &[],
            ))
            .unwrap();
        let cols = vec![String::from("k"), String::from("v")];
        catalog
            .insert("t", &cols, &[Literal::Int(1), Literal::Int(10)])
            .unwrap();

        // Bad value in the second column: nothing of the row may land.
        let result = catalog.insert(
            "t",
            &cols,
            &[Literal::Int(2), Literal::Str(String::from("oops"))],
        );
        assert!(matches!(result, Err(EngineError::TypeConversion { .. })));
        assert_eq!(catalog.get("t").unwrap().row_count(), 1);
        assert!(!catalog.get("t").unwrap().contains_key(&Value::Int(2)));
    }

    #[test]
    fn test_drop_cascades_to_children() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(create("p", "k", &[("k", DataType::Int)], &[]))
            .unwrap();
        catalog
            .create_table(create("c", "k", &[("k", DataType::Int)], &[("k", "p")]))
            .unwrap();
        catalog.drop_table("p").unwrap();
        assert!(!catalog.contains("p"));
        assert!(!catalog.contains("c"));
    }

    #[test]
    fn test_delete_cascades_through_fk() {
        let mut catalog = Catalog::new();
        catalog
            .create_table(create("p", "k", &[("k", DataType::Int)], &[]))
            .unwrap();
        catalog
            .create_table(create("c", "k", &[("k", DataType::Int)], &[("k", "p")]))
            .unwrap();
        let cols = vec![String::from("k")];
        catalog.insert("p", &cols, &[Literal::Int(1)]).unwrap();
        catalog.insert("c", &cols, &[Literal::Int(1)]).unwrap();

        let removed = catalog.delete_keys("p", &[Value::Int(1)]).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(catalog.get("c").unwrap().row_count(), 0);
    }
}
