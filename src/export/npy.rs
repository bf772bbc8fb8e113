//! NumPy `.npy` (Version 1.0) Encoder/Decoder für 2D-Arrays.
//!
//! Aufbau: Magic `\x93NUMPY`, Version `1.0`, Header-Länge (u16 LE),
//! Python-Dict als ASCII-Header (mit Leerzeichen auf 64 Bytes aufgefüllt,
//! abgeschlossen mit `\n`), danach die Rohdaten zeilenweise (C-Order).

use anyhow::{bail, ensure, Context, Result};
use std::path::Path;

/// NPY Magic Bytes
const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Magic + Version + Header-Länge
const NPY_PREAMBLE_SIZE: usize = 10;

/// Gesamtlänge von Präambel und Header ist ein Vielfaches davon
const NPY_ALIGNMENT: usize = 64;

/// Elementtyp mit festem NumPy-Typ-Deskriptor.
pub trait NpyElement: Copy {
    /// z.B. `<f8`, `|u1`
    const DESCR: &'static str;
    const SIZE: usize;

    fn write_le(self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Self;
}

impl NpyElement for u8 {
    const DESCR: &'static str = "|u1";
    const SIZE: usize = 1;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl NpyElement for f64 {
    const DESCR: &'static str = "<f8";
    const SIZE: usize = 8;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(raw)
    }
}

/// Gelesenes Array mit Form und Daten (C-Order).
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

fn format_shape(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({},)", single),
        _ => {
            let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
            format!("({})", dims.join(", "))
        }
    }
}

/// Kodiert ein Array als `.npy`-Bytes.
pub fn encode_npy<T: NpyElement>(shape: &[usize], data: &[T]) -> Result<Vec<u8>> {
    let expected: usize = shape.iter().product();
    ensure!(
        expected == data.len(),
        "NPY: Form {:?} erwartet {} Elemente, erhalten {}",
        shape,
        expected,
        data.len()
    );

    let mut header = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        T::DESCR,
        format_shape(shape)
    );
    // Auffüllen, sodass Präambel + Header + '\n' auf 64 Bytes endet
    let unpadded = NPY_PREAMBLE_SIZE + header.len() + 1;
    let padding = (NPY_ALIGNMENT - unpadded % NPY_ALIGNMENT) % NPY_ALIGNMENT;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let header_len = u16::try_from(header.len()).context("NPY-Header zu lang für Version 1.0")?;

    let mut out = Vec::with_capacity(NPY_PREAMBLE_SIZE + header.len() + data.len() * T::SIZE);
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for &value in data {
        value.write_le(&mut out);
    }
    Ok(out)
}

/// Schreibt ein Array als `.npy`-Datei.
pub fn write_npy<T: NpyElement>(path: &Path, shape: &[usize], data: &[T]) -> Result<()> {
    let bytes = encode_npy(shape, data)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("NPY-Datei konnte nicht geschrieben werden: {}", path.display()))?;
    log::debug!("NPY geschrieben: {} {:?} {}", path.display(), shape, T::DESCR);
    Ok(())
}

/// Dekodiert `.npy`-Bytes mit erwartetem Elementtyp.
pub fn decode_npy<T: NpyElement>(data: &[u8]) -> Result<NpyArray<T>> {
    ensure!(
        data.len() >= NPY_PREAMBLE_SIZE,
        "NPY-Datei zu klein: {} Bytes",
        data.len()
    );
    ensure!(&data[0..6] == NPY_MAGIC, "Ungültige NPY Magic Bytes: {:?}", &data[0..6]);
    ensure!(
        data[6] == 1 && data[7] == 0,
        "Nicht unterstützte NPY-Version {}.{}",
        data[6],
        data[7]
    );

    let header_len = u16::from_le_bytes([data[8], data[9]]) as usize;
    let body_start = NPY_PREAMBLE_SIZE + header_len;
    ensure!(data.len() >= body_start, "NPY-Header abgeschnitten");
    let header = std::str::from_utf8(&data[NPY_PREAMBLE_SIZE..body_start])
        .context("NPY-Header ist kein gültiges ASCII")?;

    let descr = header_value(header, "descr")?;
    ensure!(
        descr.trim_matches('\'') == T::DESCR,
        "NPY-Typ {} erwartet, gefunden {}",
        T::DESCR,
        descr
    );
    ensure!(
        header_value(header, "fortran_order")? == "False",
        "Fortran-Order wird nicht unterstützt"
    );
    let shape = parse_shape(header)?;

    let count: usize = shape.iter().product();
    let body = &data[body_start..];
    ensure!(
        body.len() == count * T::SIZE,
        "NPY-Daten: {} Bytes erwartet, {} vorhanden",
        count * T::SIZE,
        body.len()
    );

    let values = body.chunks_exact(T::SIZE).map(T::read_le).collect();
    Ok(NpyArray {
        shape,
        data: values,
    })
}

/// Liest eine `.npy`-Datei.
pub fn read_npy<T: NpyElement>(path: &Path) -> Result<NpyArray<T>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("NPY-Datei konnte nicht gelesen werden: {}", path.display()))?;
    decode_npy(&bytes).with_context(|| format!("Fehler in {}", path.display()))
}

/// Wert eines skalaren Header-Eintrags (bis zum nächsten Komma).
fn header_value<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let pattern = format!("'{}':", key);
    let Some(pos) = header.find(&pattern) else {
        bail!("NPY-Header ohne '{}'", key);
    };
    let rest = header[pos + pattern.len()..].trim_start();
    let end = rest.find(',').unwrap_or(rest.len());
    Ok(rest[..end].trim())
}

fn parse_shape(header: &str) -> Result<Vec<usize>> {
    let Some(pos) = header.find("'shape':") else {
        bail!("NPY-Header ohne 'shape'");
    };
    let rest = &header[pos..];
    let (Some(open), Some(close)) = (rest.find('('), rest.find(')')) else {
        bail!("NPY-Header: ungültige Form");
    };
    rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>()
                .with_context(|| format!("NPY-Header: ungültige Dimension '{}'", dim))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_aligned_and_terminated() {
        let bytes = encode_npy(&[2, 3], &[0u8, 1, 0, 1, 1, 0]).unwrap();
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        let body_start = NPY_PREAMBLE_SIZE + header_len;

        assert_eq!(body_start % 64, 0);
        assert_eq!(bytes[body_start - 1], b'\n');
        assert_eq!(&bytes[..8], b"\x93NUMPY\x01\x00");
        let header = std::str::from_utf8(&bytes[10..body_start]).unwrap();
        assert!(header.starts_with("{'descr': '|u1', 'fortran_order': False, 'shape': (2, 3), }"));
        assert_eq!(&bytes[body_start..], &[0u8, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn test_decode_f64_matrix() {
        let values = [1.0, 0.0, 3.5, 0.0, 1.0, -2.0, 0.0, 0.0, 1.0];
        let bytes = encode_npy(&[3, 3], &values).unwrap();
        let array = decode_npy::<f64>(&bytes).unwrap();
        assert_eq!(array.shape, vec![3, 3]);
        assert_eq!(array.data, values.to_vec());
    }

    #[test]
    fn test_empty_table_keeps_column_count() {
        let bytes = encode_npy::<f64>(&[0, 4], &[]).unwrap();
        let array = decode_npy::<f64>(&bytes).unwrap();
        assert_eq!(array.shape, vec![0, 4]);
        assert!(array.data.is_empty());
    }

    #[test]
    fn test_one_dimensional_shape_has_trailing_comma() {
        assert_eq!(format_shape(&[5]), "(5,)");
        assert_eq!(format_shape(&[0, 4]), "(0, 4)");
    }

    #[test]
    fn test_rejects_shape_mismatch_and_wrong_dtype() {
        assert!(encode_npy(&[2, 2], &[1.0f64; 3]).is_err());

        let bytes = encode_npy(&[1, 1], &[1u8]).unwrap();
        let err = decode_npy::<f64>(&bytes).unwrap_err();
        assert!(err.to_string().contains("<f8"));
    }
}
