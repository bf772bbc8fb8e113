//! Writer für die Argoverse-Vektorkarte (XML).

use crate::core::{VectorGraph, VectorWay};

/// Platzhalter für fehlende Nachbar-IDs.
const NONE_TAG: &str = "None";

/// Serialisiert den Spurgraphen als `<ArgoverseVectorMap>`.
///
/// Reihenfolge: alle Nodes, danach alle Ways in Einfüge-Reihenfolge. Pro Way
/// zuerst die festen Tags, dann die Node-Referenzen, dann Vorgänger/Nachfolger.
pub fn write_vector_map(graph: &VectorGraph) -> String {
    let mut output = String::new();
    output.push_str("<?xml version=\"1.0\" ?>\n");
    output.push_str("<ArgoverseVectorMap>\n");

    for node in &graph.nodes {
        output.push_str(&format!(
            "  <node id=\"{}\" x=\"{}\" y=\"{}\"/>\n",
            node.id,
            format_float(node.x),
            format_float(node.y)
        ));
    }

    for way in &graph.ways {
        write_way(&mut output, way);
    }

    output.push_str("</ArgoverseVectorMap>\n");
    output
}

fn write_way(output: &mut String, way: &VectorWay) {
    output.push_str(&format!("  <way lane_id=\"{}\">\n", way.lane_id));

    push_tag(output, "has_traffic_control", format_bool(way.has_traffic_control));
    push_tag(output, "turn_direction", way.turn_direction.as_tag());
    push_tag(output, "is_intersection", format_bool(way.is_intersection));
    push_tag(
        output,
        "l_neighbor_id",
        way.left_neighbor.as_deref().unwrap_or(NONE_TAG),
    );
    push_tag(
        output,
        "r_neighbor_id",
        way.right_neighbor.as_deref().unwrap_or(NONE_TAG),
    );

    for node_ref in &way.node_refs {
        output.push_str(&format!("    <nd ref=\"{}\"/>\n", node_ref));
    }

    for predecessor in &way.predecessors {
        push_tag(output, "predecessor", predecessor);
    }
    for successor in &way.successors {
        push_tag(output, "successor", successor);
    }

    output.push_str("  </way>\n");
}

fn push_tag(output: &mut String, key: &str, value: &str) {
    output.push_str(&format!(
        "    <tag k=\"{}\" v=\"{}\"/>\n",
        key,
        escape_xml(value)
    ));
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Kürzeste exakte Darstellung, ganzzahlige Werte mit `.0`.
fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{}.0", text)
    } else {
        text
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TurnDirection, VectorNode};

    fn sample_way() -> VectorWay {
        VectorWay {
            lane_id: 1234567,
            lane_type: "driving".to_string(),
            width: 3.5,
            node_refs: vec![0, 1],
            predecessors: vec!["4".to_string()],
            successors: vec![],
            left_neighbor: None,
            right_neighbor: Some("-2".to_string()),
            has_traffic_control: false,
            turn_direction: TurnDirection::None,
            is_intersection: true,
        }
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(1.2346), "1.2346");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_way_layout() {
        let graph = VectorGraph {
            nodes: vec![
                VectorNode { id: 0, x: 0.0, y: 0.0 },
                VectorNode { id: 1, x: 5.5, y: -2.0 },
            ],
            ways: vec![sample_way()],
        };
        let xml = write_vector_map(&graph);

        let expected = "\
<?xml version=\"1.0\" ?>
<ArgoverseVectorMap>
  <node id=\"0\" x=\"0.0\" y=\"0.0\"/>
  <node id=\"1\" x=\"5.5\" y=\"-2.0\"/>
  <way lane_id=\"1234567\">
    <tag k=\"has_traffic_control\" v=\"False\"/>
    <tag k=\"turn_direction\" v=\"NONE\"/>
    <tag k=\"is_intersection\" v=\"True\"/>
    <tag k=\"l_neighbor_id\" v=\"None\"/>
    <tag k=\"r_neighbor_id\" v=\"-2\"/>
    <nd ref=\"0\"/>
    <nd ref=\"1\"/>
    <tag k=\"predecessor\" v=\"4\"/>
  </way>
</ArgoverseVectorMap>
";
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_empty_graph_is_well_formed() {
        let xml = write_vector_map(&VectorGraph::default());
        assert!(xml.ends_with("<ArgoverseVectorMap>\n</ArgoverseVectorMap>\n"));
    }

    #[test]
    fn test_escapes_reference_values() {
        let mut way = sample_way();
        way.successors = vec!["a<b".to_string()];
        let xml = write_vector_map(&VectorGraph {
            nodes: vec![],
            ways: vec![way],
        });
        assert!(xml.contains("v=\"a&lt;b\""));
    }
}
