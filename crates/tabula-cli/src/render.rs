//! Aligned-column rendering of query results and relations.

use tabula_engine::{QueryOutput, Relation};

/// Renders a query result as an aligned table: one header line, one line
/// per row.
#[must_use]
pub fn render_query(output: &QueryOutput) -> String {
    let rows = output.row_count();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(output.columns.len());
    for (name, values) in &output.columns {
        let mut column = Vec::with_capacity(rows + 1);
        column.push(name.clone());
        column.extend(values.iter().map(ToString::to_string));
        column.resize(rows + 1, String::new());
        cells.push(column);
    }
    layout(&cells, rows + 1)
}

/// Renders a relation's contents: the primary-key header is wrapped in
/// angle brackets, and an annotation line names each FK's parent.
#[must_use]
pub fn render_relation(relation: &Relation) -> String {
    let keys = relation.all_keys();
    let has_fks = !relation.foreign_keys().is_empty();
    let height = keys.len() + 1 + usize::from(has_fks);

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(relation.columns().len());
    for column in relation.columns() {
        let mut cell_column = Vec::with_capacity(height);
        if relation.is_primary_key(&column.name) {
            cell_column.push(format!("<{}>", column.name));
        } else {
            cell_column.push(column.name.clone());
        }
        if has_fks {
            match relation.foreign_keys().get(&column.name) {
                Some(fk) => cell_column.push(format!("{}({})", fk.parent_table, fk.parent_column)),
                None => cell_column.push(String::new()),
            }
        }
        for key in &keys {
            let value = relation
                .value_of(key, &column.name)
                .map(ToString::to_string)
                .unwrap_or_default();
            cell_column.push(value);
        }
        cells.push(cell_column);
    }

    format!("{}\n{}", relation.name(), layout(&cells, height))
}

/// Pads column-major cells into aligned lines.
fn layout(columns: &[Vec<String>], height: usize) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .map(|column| column.iter().map(String::len).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for row in 0..height {
        let mut line = String::new();
        for (column, &width) in columns.iter().zip(&widths) {
            let cell = column.get(row).map_or("", String::as_str);
            if !line.is_empty() {
                line.push_str("  ");
            }
            line.push_str(&format!("{cell:<width$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
