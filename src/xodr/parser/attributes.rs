//! Attribut-Zugriff für OpenDRIVE-Elemente.

use anyhow::{ensure, Context, Result};
use quick_xml::encoding::Decoder;
use quick_xml::events::BytesStart;
use std::collections::HashMap;

/// Alle Attribute eines Elements, dekodiert und entescaped.
#[derive(Debug, Default)]
pub(crate) struct AttrMap {
    values: HashMap<String, String>,
}

impl AttrMap {
    pub(crate) fn from_element(element: &BytesStart<'_>, decoder: Decoder) -> Result<Self> {
        let mut values = HashMap::new();
        for attr in element.attributes().with_checks(false) {
            let attr = attr?;
            let key = decoder.decode(attr.key.as_ref())?.into_owned();
            let value = attr.unescape_value()?.into_owned();
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    pub(crate) fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Pflichtattribut als Zahl.
    pub(crate) fn required_f64(&self, tag: &str, key: &str) -> Result<f64> {
        let raw = self
            .text(key)
            .with_context(|| format!("<{}> ohne Pflichtattribut '{}'", tag, key))?;
        parse_number(tag, key, raw)
    }

    /// Optionales Attribut als Zahl, fehlend = `default`.
    pub(crate) fn f64_or(&self, tag: &str, key: &str, default: f64) -> Result<f64> {
        match self.text(key) {
            Some(raw) => parse_number(tag, key, raw),
            None => Ok(default),
        }
    }

    /// Referenz-ID; leer oder `"None"` zählt als nicht vorhanden.
    pub(crate) fn reference(&self, key: &str) -> Option<String> {
        normalize_reference(self.text(key))
    }
}

pub(crate) fn normalize_reference(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed == "None" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_number(tag: &str, key: &str, raw: &str) -> Result<f64> {
    let value = raw.trim().parse::<f64>().with_context(|| {
        format!(
            "<{} {}=\"{}\"> ist keine gültige Zahl",
            tag,
            key,
            truncate_for_error(raw)
        )
    })?;
    ensure!(
        value.is_finite(),
        "<{} {}=\"{}\"> ist nicht endlich",
        tag,
        key,
        truncate_for_error(raw)
    );
    Ok(value)
}

/// Kürzt einen String für Fehlermeldungen auf max. 40 Zeichen
fn truncate_for_error(s: &str) -> &str {
    match s.char_indices().nth(40) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
