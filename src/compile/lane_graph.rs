//! Aufbau des Vektor-Spurgraphen aus geparsten Straßen.
//!
//! Im deduplizierten Modus wird über gerundete Koordinaten zusammengeführt,
//! analog zur Node-Deduplizierung über ein Raster aus `(i64, i64)`-Schlüsseln.

use indexmap::IndexMap;

use super::lane_ids::LaneIdAllocator;
use crate::core::{
    CompileError, LaneRecord, PointKey, Quantizer, RoadNetwork, RoadSegment, TableIndexMap,
    TurnDirection, VectorGraph, VectorNode, VectorWay,
};
use crate::shared::CompilerOptions;

/// Identität einer Spur: gerundete Node-Koordinaten, Typ, gerundete Breite.
type LaneKey = (Vec<PointKey>, String, i64);

/// Zusammenführungsstrategie des Graphen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphMode {
    /// Neuer Node pro Primitiv, neue ID pro Spur
    PerDocument,
    /// Nodes und Spuren über gerundete Schlüssel zusammenführen (erste gewinnt)
    Deduplicated,
}

/// Änderungen durch ein einzelnes Dokument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphDelta {
    pub nodes_added: usize,
    pub nodes_reused: usize,
    pub lanes_added: usize,
    pub lanes_merged: usize,
    /// Straßen ohne Geometrie (nur im deduplizierten Modus übersprungen)
    pub roads_skipped: usize,
}

/// Füllstand des Compilers vor einem Dokument; siehe [`LaneGraphCompiler::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphCheckpoint {
    nodes: usize,
    ways: usize,
    table_entries: usize,
    node_keys: usize,
    lane_keys: usize,
}

/// Baut Graph und Table-Index-Map über ein oder mehrere Dokumente auf.
#[derive(Debug, Clone)]
pub struct LaneGraphCompiler {
    mode: GraphMode,
    quantizer: Quantizer,
    default_lane_width: f64,
    default_lane_type: String,
    graph: VectorGraph,
    table_map: TableIndexMap,
    node_index: IndexMap<PointKey, u64>,
    lane_index: IndexMap<LaneKey, u32>,
}

impl LaneGraphCompiler {
    pub fn new(mode: GraphMode, options: &CompilerOptions) -> Self {
        Self {
            mode,
            quantizer: Quantizer::new(options.node_precision),
            default_lane_width: options.default_lane_width,
            default_lane_type: options.default_lane_type.clone(),
            graph: VectorGraph::default(),
            table_map: TableIndexMap::new(),
            node_index: IndexMap::new(),
            lane_index: IndexMap::new(),
        }
    }

    pub fn mode(&self) -> GraphMode {
        self.mode
    }

    pub fn graph(&self) -> &VectorGraph {
        &self.graph
    }

    pub fn table_map(&self) -> &TableIndexMap {
        &self.table_map
    }

    pub fn into_parts(self) -> (VectorGraph, TableIndexMap) {
        (self.graph, self.table_map)
    }

    pub fn checkpoint(&self) -> GraphCheckpoint {
        GraphCheckpoint {
            nodes: self.graph.nodes.len(),
            ways: self.graph.ways.len(),
            table_entries: self.table_map.len(),
            node_keys: self.node_index.len(),
            lane_keys: self.lane_index.len(),
        }
    }

    /// Verwirft alles, was seit `checkpoint` hinzukam, und gibt die dabei
    /// vergebenen Lane-IDs an `ids` zurück. Liefert die Anzahl freigegebener IDs.
    pub fn rollback(&mut self, checkpoint: GraphCheckpoint, ids: &mut LaneIdAllocator) -> usize {
        let mut released = 0;
        for (_, lane_id) in self.table_map.iter().skip(checkpoint.table_entries) {
            if ids.release(lane_id) {
                released += 1;
            }
        }
        self.table_map.truncate(checkpoint.table_entries);
        self.graph.ways.truncate(checkpoint.ways);
        self.graph.nodes.truncate(checkpoint.nodes);
        self.node_index.truncate(checkpoint.node_keys);
        self.lane_index.truncate(checkpoint.lane_keys);
        released
    }

    /// Fügt alle Straßen eines Dokuments hinzu.
    ///
    /// Bricht beim ersten Fehler der ID-Vergabe ab; der Compiler ist dann
    /// teilweise verändert. Mit [`LaneGraphCompiler::checkpoint`] und
    /// [`LaneGraphCompiler::rollback`] lässt sich der Stand davor herstellen.
    pub fn compile_document(
        &mut self,
        network: &RoadNetwork,
        ids: &mut LaneIdAllocator,
    ) -> Result<GraphDelta, CompileError> {
        let mut delta = GraphDelta::default();

        for road in &network.roads {
            let (node_refs, node_keys) = self.road_nodes(road, &mut delta);

            if self.mode == GraphMode::Deduplicated && node_refs.is_empty() {
                delta.roads_skipped += 1;
                continue;
            }

            for lane in road.lanes() {
                let lane_type = if lane.lane_type.is_empty() {
                    self.default_lane_type.clone()
                } else {
                    lane.lane_type.clone()
                };
                let width = lane.width.unwrap_or(self.default_lane_width);

                let key = match self.mode {
                    GraphMode::Deduplicated => {
                        let key = (node_keys.clone(), lane_type.clone(), self.quantizer.key(width));
                        if self.lane_index.contains_key(&key) {
                            delta.lanes_merged += 1;
                            continue;
                        }
                        Some(key)
                    }
                    GraphMode::PerDocument => None,
                };

                let lane_id = ids.allocate()?;
                self.table_map.push(lane_id);
                self.graph
                    .ways
                    .push(build_way(road, lane, lane_id, lane_type, width, &node_refs));
                if let Some(key) = key {
                    self.lane_index.insert(key, lane_id);
                }
                delta.lanes_added += 1;
            }
        }

        log::debug!(
            "Spurgraph: +{} Nodes ({} wiederverwendet), +{} Spuren ({} zusammengeführt)",
            delta.nodes_added,
            delta.nodes_reused,
            delta.lanes_added,
            delta.lanes_merged
        );
        Ok(delta)
    }

    /// Node-Referenzen einer Straße (ein Node pro Primitiv-Start).
    fn road_nodes(
        &mut self,
        road: &RoadSegment,
        delta: &mut GraphDelta,
    ) -> (Vec<u64>, Vec<PointKey>) {
        let mut refs = Vec::with_capacity(road.geometry.len());
        let mut keys = Vec::new();

        for primitive in &road.geometry {
            match self.mode {
                GraphMode::PerDocument => {
                    let id = self.graph.nodes.len() as u64;
                    self.graph.nodes.push(VectorNode {
                        id,
                        x: primitive.x,
                        y: primitive.y,
                    });
                    delta.nodes_added += 1;
                    refs.push(id);
                }
                GraphMode::Deduplicated => {
                    let key = self.quantizer.point_key(primitive.x, primitive.y);
                    let id = match self.node_index.get(&key) {
                        Some(&id) => {
                            delta.nodes_reused += 1;
                            id
                        }
                        None => {
                            let id = self.node_index.len() as u64;
                            self.node_index.insert(key, id);
                            self.graph.nodes.push(VectorNode {
                                id,
                                x: self.quantizer.round(primitive.x),
                                y: self.quantizer.round(primitive.y),
                            });
                            delta.nodes_added += 1;
                            id
                        }
                    };
                    refs.push(id);
                    keys.push(key);
                }
            }
        }

        (refs, keys)
    }
}

fn build_way(
    road: &RoadSegment,
    lane: &LaneRecord,
    lane_id: u32,
    lane_type: String,
    width: f64,
    node_refs: &[u64],
) -> VectorWay {
    VectorWay {
        lane_id,
        lane_type,
        width,
        node_refs: node_refs.to_vec(),
        predecessors: road
            .link
            .predecessor
            .iter()
            .map(|target| target.element_id.clone())
            .collect(),
        successors: road
            .link
            .successor
            .iter()
            .map(|target| target.element_id.clone())
            .collect(),
        left_neighbor: lane.left_neighbor.clone(),
        right_neighbor: lane.right_neighbor.clone(),
        has_traffic_control: false,
        turn_direction: TurnDirection::None,
        is_intersection: road.is_intersection(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GeometryPrimitive, LaneSection, LinkTarget, RoadLink};

    fn road(id: &str, start: (f64, f64), lanes: Vec<LaneRecord>) -> RoadSegment {
        RoadSegment {
            id: id.to_string(),
            geometry: vec![
                GeometryPrimitive::line(start.0, start.1, 0.0, 5.0),
                GeometryPrimitive::line(start.0 + 5.0, start.1, 0.0, 5.0),
            ],
            lane_sections: vec![LaneSection { s: 0.0, lanes }],
            ..Default::default()
        }
    }

    fn network(roads: Vec<RoadSegment>) -> RoadNetwork {
        RoadNetwork { name: None, roads }
    }

    fn allocator() -> LaneIdAllocator {
        LaneIdAllocator::new(Some(42), 1000)
    }

    #[test]
    fn test_per_document_fresh_nodes_and_ids() {
        let doc = network(vec![
            road(
                "1",
                (0.0, 0.0),
                vec![LaneRecord::driving("-1", 3.5), LaneRecord::driving("1", 3.5)],
            ),
            road("2", (0.0, 0.0), vec![LaneRecord::driving("-1", 3.5)]),
        ]);
        let mut compiler =
            LaneGraphCompiler::new(GraphMode::PerDocument, &CompilerOptions::default());
        let delta = compiler.compile_document(&doc, &mut allocator()).unwrap();

        assert_eq!(delta.nodes_added, 4);
        assert_eq!(delta.lanes_added, 3);
        let graph = compiler.graph();
        let ids: Vec<u64> = graph.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(graph.ways[0].node_refs, vec![0, 1]);
        assert_eq!(graph.ways[2].node_refs, vec![2, 3]);
        assert_eq!(compiler.table_map().len(), 3);
        assert_eq!(compiler.table_map().get(2), Some(graph.ways[2].lane_id));
    }

    #[test]
    fn test_rollback_restores_state_and_releases_ids() {
        let mut compiler =
            LaneGraphCompiler::new(GraphMode::Deduplicated, &CompilerOptions::default());
        // Drei IDs: das erste Dokument braucht eine, das zweite vier
        let mut ids = LaneIdAllocator::with_range(Some(3), 50, 1_000_000..=1_000_002);
        let first = network(vec![road("1", (0.0, 0.0), vec![LaneRecord::driving("-1", 3.5)])]);
        compiler.compile_document(&first, &mut ids).unwrap();
        let before = compiler.graph().clone();
        let table_before = compiler.table_map().clone();

        let checkpoint = compiler.checkpoint();
        let second = network(vec![road(
            "2",
            (50.0, 0.0),
            vec![
                LaneRecord::driving("-1", 3.0),
                LaneRecord::driving("-2", 3.1),
                LaneRecord::driving("-3", 3.2),
                LaneRecord::driving("-4", 3.3),
            ],
        )]);
        let err = compiler.compile_document(&second, &mut ids).unwrap_err();
        assert_eq!(err.code(), "E_ID_EXHAUSTED");

        assert_eq!(compiler.rollback(checkpoint, &mut ids), 2);
        assert_eq!(compiler.graph(), &before);
        assert_eq!(compiler.table_map(), &table_before);
        assert_eq!(compiler.checkpoint(), checkpoint);
        assert_eq!(ids.issued_count(), 1);

        // Derselbe Startpunkt wird wieder als neuer Node vergeben
        let third = network(vec![road("3", (50.0, 0.0), vec![LaneRecord::driving("-1", 3.0)])]);
        let delta = compiler.compile_document(&third, &mut ids).unwrap();
        assert_eq!(delta.nodes_added, 2);
        assert_eq!(compiler.graph().nodes[2].id, 2);
    }

    #[test]
    fn test_per_document_keeps_roads_without_geometry() {
        let mut empty = road("9", (0.0, 0.0), vec![LaneRecord::driving("-1", 3.0)]);
        empty.geometry.clear();
        let mut compiler =
            LaneGraphCompiler::new(GraphMode::PerDocument, &CompilerOptions::default());
        compiler.compile_document(&network(vec![empty.clone()]), &mut allocator()).unwrap();
        assert_eq!(compiler.graph().way_count(), 1);
        assert!(compiler.graph().ways[0].node_refs.is_empty());

        let mut dedup =
            LaneGraphCompiler::new(GraphMode::Deduplicated, &CompilerOptions::default());
        let delta = dedup.compile_document(&network(vec![empty]), &mut allocator()).unwrap();
        assert_eq!(delta.roads_skipped, 1);
        assert!(dedup.graph().is_empty());
    }

    #[test]
    fn test_dedup_merges_identical_lane_across_documents() {
        let mut compiler =
            LaneGraphCompiler::new(GraphMode::Deduplicated, &CompilerOptions::default());
        let mut ids = allocator();

        let first = network(vec![road("1", (0.0, 0.0), vec![LaneRecord::driving("-1", 3.5)])]);
        let second = network(vec![road("7", (0.00001, 0.0), vec![LaneRecord::driving("-2", 3.5)])]);
        compiler.compile_document(&first, &mut ids).unwrap();
        let delta = compiler.compile_document(&second, &mut ids).unwrap();

        assert_eq!(delta.nodes_added, 0);
        assert_eq!(delta.nodes_reused, 2);
        assert_eq!(delta.lanes_merged, 1);
        assert_eq!(compiler.graph().way_count(), 1);
        assert_eq!(compiler.table_map().len(), 1);
        assert_eq!(ids.issued_count(), 1);
    }

    #[test]
    fn test_dedup_distinguishes_type_and_width() {
        let mut compiler =
            LaneGraphCompiler::new(GraphMode::Deduplicated, &CompilerOptions::default());
        let mut sidewalk = LaneRecord::driving("-2", 3.5);
        sidewalk.lane_type = "sidewalk".to_string();
        let doc = network(vec![road(
            "1",
            (0.0, 0.0),
            vec![
                LaneRecord::driving("-1", 3.5),
                sidewalk,
                LaneRecord::driving("-3", 3.0),
                LaneRecord::driving("-4", 3.5),
            ],
        )]);

        let delta = compiler.compile_document(&doc, &mut allocator()).unwrap();
        assert_eq!(delta.lanes_added, 3);
        assert_eq!(delta.lanes_merged, 1);

        let keys: Vec<(usize, u32)> = compiler.table_map().iter().collect();
        assert_eq!(keys.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_dedup_nodes_are_rounded_and_numbered_in_order() {
        let mut compiler =
            LaneGraphCompiler::new(GraphMode::Deduplicated, &CompilerOptions::default());
        let doc = network(vec![road("1", (1.234567, 0.0), vec![LaneRecord::driving("-1", 3.5)])]);
        compiler.compile_document(&doc, &mut allocator()).unwrap();

        let node = compiler.graph().nodes[0];
        assert_eq!(node.id, 0);
        assert!((node.x - 1.2346).abs() < 1e-12);
        assert_eq!(compiler.graph().nodes[1].id, 1);
    }

    #[test]
    fn test_topology_and_defaults() {
        let mut lane = LaneRecord::driving("-1", 0.0);
        lane.width = None;
        lane.lane_type = String::new();
        lane.left_neighbor = Some("1".to_string());
        let mut segment = road("5", (0.0, 0.0), vec![lane]);
        segment.junction = Some("3".to_string());
        segment.link = RoadLink {
            predecessor: Some(LinkTarget {
                element_id: "4".to_string(),
                element_type: Some("road".to_string()),
            }),
            successor: None,
        };

        let mut compiler =
            LaneGraphCompiler::new(GraphMode::PerDocument, &CompilerOptions::default());
        compiler
            .compile_document(&network(vec![segment]), &mut allocator())
            .unwrap();

        let way = &compiler.graph().ways[0];
        assert_eq!(way.width, 3.5);
        assert_eq!(way.lane_type, "driving");
        assert_eq!(way.predecessors, vec!["4".to_string()]);
        assert!(way.successors.is_empty());
        assert_eq!(way.left_neighbor.as_deref(), Some("1"));
        assert_eq!(way.right_neighbor, None);
        assert!(way.is_intersection);
        assert!(!way.has_traffic_control);
        assert_eq!(way.turn_direction, TurnDirection::None);
    }

    #[test]
    fn test_exhausted_ids_abort_document() {
        let doc = network(vec![road(
            "1",
            (0.0, 0.0),
            vec![LaneRecord::driving("-1", 3.5), LaneRecord::driving("-2", 3.0)],
        )]);
        let mut ids = LaneIdAllocator::with_range(Some(1), 20, 1_000_000..=1_000_000);
        let mut compiler =
            LaneGraphCompiler::new(GraphMode::PerDocument, &CompilerOptions::default());

        let err = compiler.compile_document(&doc, &mut ids).unwrap_err();
        assert_eq!(err.code(), "E_ID_EXHAUSTED");
    }
}
