//! OpenDRIVE-Import (`.xodr`).
//!
//! Liest Straßen, Referenzlinien-Geometrie, Höhenprofile, Lane-Sections und
//! Straßenverknüpfungen in ein [`RoadNetwork`](crate::core::RoadNetwork).

pub mod parser;

pub use parser::{parse_xodr, parse_xodr_file};
