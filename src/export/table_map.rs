//! Export der Table-Index-Map als JSON (`{"0": lane_id, ...}`, 4 Leerzeichen Einzug).

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;

use crate::core::TableIndexMap;

/// Serialisiert die Map mit Schlüsseln in Index-Reihenfolge.
pub fn write_table_map(map: &TableIndexMap) -> Result<String> {
    let keyed = map.to_string_keyed();
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    keyed
        .serialize(&mut serializer)
        .context("Table-Index-Map konnte nicht serialisiert werden")?;
    String::from_utf8(buffer).context("Table-Index-Map ist kein gültiges UTF-8")
}

/// Liest eine exportierte Map zurück (Schlüssel als String).
pub fn read_table_map(json: &str) -> Result<IndexMap<String, u32>> {
    serde_json::from_str(json).context("Table-Index-Map ist kein gültiges JSON")
}
