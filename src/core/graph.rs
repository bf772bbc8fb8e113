//! Vektor-Spurgraph: Nodes, Ways (Spuren) und die Table-Index-Map.

use indexmap::IndexMap;

/// Geometrie-Node des Graphen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorNode {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

/// Abbiegerichtung einer Spur. Wird nicht aus der Geometrie abgeleitet,
/// jede Spur trägt `NONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnDirection {
    #[default]
    None,
}

impl TurnDirection {
    pub fn as_tag(&self) -> &'static str {
        match self {
            TurnDirection::None => "NONE",
        }
    }
}

/// Eine Spur im Graphen mit synthetischer, 7-stelliger ID.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorWay {
    pub lane_id: u32,
    pub lane_type: String,
    pub width: f64,
    /// Geordnete Node-Referenzen entlang der Referenzlinie
    pub node_refs: Vec<u64>,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
    /// `None` wird beim Export als `"None"` geschrieben
    pub left_neighbor: Option<String>,
    pub right_neighbor: Option<String>,
    pub has_traffic_control: bool,
    pub turn_direction: TurnDirection,
    pub is_intersection: bool,
}

/// Knoten und Spuren in Einfüge-Reihenfolge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorGraph {
    pub nodes: Vec<VectorNode>,
    pub ways: Vec<VectorWay>,
}

impl VectorGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.ways.is_empty()
    }
}

/// Dichte Zuordnung Table-Index → Lane-ID in Entdeckungsreihenfolge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableIndexMap {
    entries: IndexMap<usize, u32>,
}

impl TableIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hängt eine Lane-ID mit dem nächsten freien Index an.
    pub fn push(&mut self, lane_id: u32) -> usize {
        let index = self.entries.len();
        self.entries.insert(index, lane_id);
        index
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.entries.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Behält nur die ersten `len` Einträge.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Einträge in Index-Reihenfolge.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.entries.iter().map(|(index, id)| (*index, *id))
    }

    /// Schlüssel als String, wie im JSON-Export.
    pub fn to_string_keyed(&self) -> IndexMap<String, u32> {
        self.iter()
            .map(|(index, id)| (index.to_string(), id))
            .collect()
    }
}
