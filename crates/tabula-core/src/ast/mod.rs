//! Abstract syntax tree for the command language.

mod command;
mod expr;
mod types;

pub use command::{
    Aggregate, Command, CreateTable, Delete, ForeignKeyDef, Insert, JoinSpec, Load, Projection,
    Select, SourceRef, Update,
};
pub use expr::{ArithExpr, CmpOp, ColumnRef, Condition, Connective, Literal, NumOp, WhereClause};
pub use types::{ColumnDef, DataType};
