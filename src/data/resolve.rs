//! Identifier-axis resolution for uploaded tables.
//!
//! Both uploaded tables arrive with a positional row index. One promotion
//! policy decides which column, if any, becomes the identifier axis; the
//! metadata table and the expression table each get their own instance of
//! it, so the two resolutions never share state.

use super::table::Table;
use crate::error::Result;

/// Column names recognized as sample identifiers, matched
/// case-insensitively.
const ID_COLUMN_NAMES: &[&str] = &["sample", "sample_id", "sampleid", "id", "name"];

/// Resolve the sample identifier axis of a metadata table.
///
/// Priority, first match wins:
/// 1. an already-resolved identifier axis is kept unchanged;
/// 2. the first column named like a sample id (see [`ID_COLUMN_NAMES`])
///    whose values are all distinct is promoted;
/// 3. the first column, if non-numeric and all distinct, is promoted;
/// 4. otherwise the table keeps its positional index and downstream
///    alignment will find no overlap.
pub fn resolve_sample_axis(table: Table) -> Result<Table> {
    if table.index().is_some() {
        return Ok(table);
    }
    if let Some(name) = named_id_candidate(&table) {
        return table.set_index(&name);
    }
    if let Some(name) = first_column_candidate(&table) {
        return table.set_index(&name);
    }
    Ok(table)
}

/// Resolve the feature identifier axis of an expression table.
///
/// The expression table's rows are genes, so only the first-column rule
/// applies: when the row index is still positional and the first column
/// holds distinct text, that column becomes the gene-id axis. Columns
/// named like sample ids are left alone here; they are samples.
pub fn resolve_feature_axis(table: Table) -> Result<Table> {
    if table.index().is_some() {
        return Ok(table);
    }
    if let Some(name) = first_column_candidate(&table) {
        return table.set_index(&name);
    }
    Ok(table)
}

fn named_id_candidate(table: &Table) -> Option<String> {
    table
        .columns()
        .iter()
        .find(|col| {
            ID_COLUMN_NAMES.contains(&col.name().to_lowercase().as_str()) && col.all_distinct()
        })
        .map(|col| col.name().to_string())
}

fn first_column_candidate(table: &Table) -> Option<String> {
    let first = table.columns().first()?;
    if !first.is_numeric() && first.all_distinct() {
        Some(first.name().to_string())
    } else {
        None
    }
}
