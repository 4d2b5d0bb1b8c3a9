//! Automatic selection and validation of plot aesthetic channels.
//!
//! Color and symbol come from categorical metadata columns, size from a
//! numeric one. Users may pin any channel to a named column; a pinned name
//! is validated against the metadata and always wins over auto-selection.

use crate::data::table::{ColumnType, Table};
use crate::error::{PcaVizError, Result};
use serde::{Deserialize, Serialize};

/// Per-channel request state.
///
/// `Auto` triggers auto-selection; `Named` is validated at resolution time,
/// so an unknown name fails the request before any plot is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelRequest {
    #[default]
    Auto,
    Named(String),
}

impl ChannelRequest {
    /// Build from an optional form value; absent or empty means auto.
    pub fn from_option(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.is_empty() => ChannelRequest::Named(name),
            _ => ChannelRequest::Auto,
        }
    }
}

/// Requested bindings for the three channels.
#[derive(Debug, Clone, Default)]
pub struct ChannelRequests {
    pub color: ChannelRequest,
    pub symbol: ChannelRequest,
    pub size: ChannelRequest,
}

/// Resolved aesthetic mapping. Channels that found no column stay unbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AestheticMapping {
    pub color_col: Option<String>,
    pub symbol_col: Option<String>,
    pub size_col: Option<String>,
}

/// Resolve channel requests against the retained metadata.
///
/// Auto-selection, per channel: color takes the first categorical column
/// in table order, symbol the second distinct categorical column (falling
/// back to the color column), size the first numeric column. Cardinality
/// is judged on the retained subset, so a column that collapses to one
/// level after alignment is no longer a candidate.
pub fn resolve_aesthetics(
    metadata: &Table,
    requests: &ChannelRequests,
) -> Result<AestheticMapping> {
    let mut categorical: Vec<&str> = Vec::new();
    let mut numeric: Vec<&str> = Vec::new();
    for column in metadata.columns() {
        match column.column_type() {
            ColumnType::Numeric => numeric.push(column.name()),
            ColumnType::Categorical => categorical.push(column.name()),
            ColumnType::Text => {}
        }
    }

    let auto_color = categorical.first().map(|s| s.to_string());
    let auto_symbol = categorical
        .get(1)
        .map(|s| s.to_string())
        .or_else(|| auto_color.clone());
    let auto_size = numeric.first().map(|s| s.to_string());

    Ok(AestheticMapping {
        color_col: resolve_channel(metadata, &requests.color, "color", auto_color)?,
        symbol_col: resolve_channel(metadata, &requests.symbol, "symbol", auto_symbol)?,
        size_col: resolve_channel(metadata, &requests.size, "size", auto_size)?,
    })
}

fn resolve_channel(
    metadata: &Table,
    request: &ChannelRequest,
    channel: &str,
    auto: Option<String>,
) -> Result<Option<String>> {
    match request {
        ChannelRequest::Auto => Ok(auto),
        ChannelRequest::Named(name) => {
            if metadata.has_column(name) {
                Ok(Some(name.clone()))
            } else {
                Err(PcaVizError::UnknownColumn {
                    channel: channel.to_string(),
                    column: name.clone(),
                })
            }
        }
    }
}
