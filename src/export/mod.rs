//! Serialisierung der Artefakte: `.npy`-Arrays, JSON-Map, XML-Vektorkarte, PNG-Vorschau.

pub mod artifacts;
pub mod npy;
pub mod preview;
pub mod table_map;
pub mod vector_map;

pub use artifacts::{write_artifacts, WrittenArtifacts};
pub use npy::{decode_npy, encode_npy, read_npy, write_npy, NpyArray, NpyElement};
pub use preview::{occupancy_preview, save_occupancy_preview};
pub use table_map::{read_table_map, write_table_map};
pub use vector_map::write_vector_map;
