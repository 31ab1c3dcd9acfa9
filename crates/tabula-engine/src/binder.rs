//! Resolution of source aliases and column references.

use indexmap::IndexMap;
use tabula_core::ast::{ColumnRef, SourceRef};

use crate::catalog::Catalog;
use crate::error::{EngineError, Result};
use crate::relation::Relation;

/// A column reference resolved against the query's sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumn {
    /// The source binding (alias, or the table name when unaliased).
    pub binding: String,
    /// The column name.
    pub column: String,
}

/// Maps the bindings of one query to catalog relations and resolves
/// column references against them.
pub struct Binder<'a> {
    catalog: &'a Catalog,
    /// binding -> relation name, in source order.
    sources: IndexMap<String, String>,
}

impl<'a> Binder<'a> {
    /// Builds a binder for the given source list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownTable`] for an unregistered relation or
    /// [`EngineError::DuplicateBinding`] when two sources share a binding.
    pub fn new(catalog: &'a Catalog, sources: &[SourceRef]) -> Result<Self> {
        let mut map = IndexMap::with_capacity(sources.len());
        for source in sources {
            catalog.get(&source.table)?;
            let binding = String::from(source.binding());
            if map.insert(binding.clone(), source.table.clone()).is_some() {
                return Err(EngineError::DuplicateBinding(binding));
            }
        }
        Ok(Self {
            catalog,
            sources: map,
        })
    }

    /// Iterates `(binding, relation name)` pairs in source order.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources
            .iter()
            .map(|(b, t)| (b.as_str(), t.as_str()))
    }

    /// Number of sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true when no source is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The binding of the first source.
    #[must_use]
    pub fn first_binding(&self) -> Option<&str> {
        self.sources.keys().next().map(String::as_str)
    }

    /// The relation behind a binding.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAlias`] for an unknown binding.
    pub fn relation(&self, binding: &str) -> Result<&'a Relation> {
        let table = self
            .sources
            .get(binding)
            .ok_or_else(|| EngineError::UnknownAlias(String::from(binding)))?;
        self.catalog.get(table)
    }

    /// Resolves a column reference to its owning binding.
    ///
    /// A qualified reference must name a declared binding holding the
    /// column. An unqualified reference binds to the unique source whose
    /// relation declares the column; absence and ambiguity are errors.
    ///
    /// # Errors
    ///
    /// Returns a binding error as described above.
    pub fn resolve(&self, column_ref: &ColumnRef) -> Result<BoundColumn> {
        if let Some(qualifier) = &column_ref.qualifier {
            let relation = self.relation(qualifier)?;
            if !relation.has_column(&column_ref.column) {
                return Err(EngineError::UnknownColumn {
                    table: String::from(relation.name()),
                    column: column_ref.column.clone(),
                });
            }
            return Ok(BoundColumn {
                binding: qualifier.clone(),
                column: column_ref.column.clone(),
            });
        }

        let mut owner: Option<&str> = None;
        for (binding, table) in &self.sources {
            let relation = self.catalog.get(table)?;
            if relation.has_column(&column_ref.column) {
                if owner.is_some() {
                    return Err(EngineError::AmbiguousColumn(column_ref.column.clone()));
                }
                owner = Some(binding);
            }
        }

        match owner {
            Some(binding) => Ok(BoundColumn {
                binding: String::from(binding),
                column: column_ref.column.clone(),
            }),
            None => Err(EngineError::UnboundColumn(column_ref.column.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::ast::{ColumnDef, CreateTable, DataType};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for (name, cols) in [("df1", vec!["Letter", "Number"]), ("df2", vec!["name", "year"])] {
            catalog
                .create_table(CreateTable {
                    name: String::from(name),
                    columns: cols
                        .iter()
                        .map(|c| ColumnDef {
                            name: String::from(*c),
                            data_type: DataType::Varchar(8),
                        })
                        .collect(),
                    primary_key: String::from(cols[0]),
                    foreign_keys: vec![],
                })
                .unwrap();
        }
        catalog
    }

    fn sources() -> Vec<SourceRef> {
        vec![
            SourceRef {
                table: String::from("df1"),
                alias: Some(String::from("a")),
            },
            SourceRef {
                table: String::from("df2"),
                alias: Some(String::from("b")),
            },
        ]
    }

    #[test]
    fn test_qualified_resolution() {
        let catalog = catalog();
        let binder = Binder::new(&catalog, &sources()).unwrap();
        let bound = binder.resolve(&ColumnRef::qualified("b", "year")).unwrap();
        assert_eq!(bound.binding, "b");
        assert!(matches!(
            binder.resolve(&ColumnRef::qualified("z", "year")),
            Err(EngineError::UnknownAlias(_))
        ));
    }

    #[test]
    fn test_unqualified_binds_to_unique_owner() {
        let catalog = catalog();
        let binder = Binder::new(&catalog, &sources()).unwrap();
        let bound = binder.resolve(&ColumnRef::bare("Number")).unwrap();
        assert_eq!(bound.binding, "a");
        assert!(matches!(
            binder.resolve(&ColumnRef::bare("ghost")),
            Err(EngineError::UnboundColumn(_))
        ));
    }
}
