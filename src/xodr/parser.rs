//! Streaming-Parser für OpenDRIVE-Dokumente.

mod attributes;

use crate::core::road::{
    ElevationRecord, GeometryPrimitive, LaneRecord, LaneSection, LinkTarget, PrimitiveKind,
    RoadNetwork, RoadSegment,
};
use crate::core::CompileError;
use crate::shared::options::DEFAULT_LANE_TYPE;
use anyhow::{Context, Result};
use attributes::{normalize_reference, AttrMap};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// Parsed ein OpenDRIVE-Dokument aus einem XML-String.
///
/// Jeder Fehler (XML-Syntax, fehlende Pflichtattribute, ungültige Zahlen)
/// wird als [`CompileError::ParseFailure`] gemeldet; ein halb gelesenes
/// Dokument wird nie zurückgegeben.
pub fn parse_xodr(xml_content: &str) -> Result<RoadNetwork> {
    parse_document(xml_content)
        .map_err(|e| anyhow::Error::new(CompileError::ParseFailure(format!("{e:#}"))))
}

/// Liest und parsed eine `.xodr`-Datei.
pub fn parse_xodr_file(path: &Path) -> Result<RoadNetwork> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Datei konnte nicht gelesen werden: {}", path.display()))?;
    let network =
        parse_xodr(&content).with_context(|| format!("Fehler in {}", path.display()))?;

    log::debug!(
        "{}: {} Straßen, {} Primitive, {} Spuren",
        path.display(),
        network.roads.len(),
        network.primitive_count(),
        network.lane_count()
    );
    Ok(network)
}

/// Laufender Zustand beim Durchlaufen des Dokuments.
#[derive(Default)]
struct ParseState {
    network: RoadNetwork,
    saw_root: bool,

    road: Option<RoadSegment>,
    geometry: Option<GeometryPrimitive>,
    section: Option<LaneSection>,
    lane: Option<LaneRecord>,

    in_road_link: bool,
    in_elevation_profile: bool,
    in_lanes: bool,
    lane_offset_seen: bool,
    lane_width_seen: bool,
}

fn parse_document(xml_content: &str) -> Result<RoadNetwork> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);

    let mut buffer = Vec::new();
    let mut state = ParseState::default();

    loop {
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => {
                let attrs = AttrMap::from_element(e, reader.decoder())?;
                let tag = element_name(&reader, e)?;
                state.open(&tag, &attrs)?;
            }
            Ok(Event::Empty(ref e)) => {
                // Leere Elemente werden geöffnet und sofort geschlossen
                let attrs = AttrMap::from_element(e, reader.decoder())?;
                let tag = element_name(&reader, e)?;
                state.open(&tag, &attrs)?;
                state.close(&tag);
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let tag = reader.decoder().decode(name.as_ref())?;
                state.close(&tag);
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("XML-Fehler an Position {}", reader.buffer_position())
                })
            }
            _ => {}
        }

        buffer.clear();
    }

    if !state.saw_root {
        log::warn!("Kein <OpenDRIVE>-Wurzelelement gefunden, Inhalt wird trotzdem gelesen");
    }

    Ok(state.network)
}

fn element_name(reader: &Reader<&[u8]>, element: &BytesStart<'_>) -> Result<String> {
    let name = element.name();
    Ok(reader.decoder().decode(name.as_ref())?.into_owned())
}

impl ParseState {
    fn open(&mut self, tag: &str, attrs: &AttrMap) -> Result<()> {
        match tag {
            "OpenDRIVE" => self.saw_root = true,
            "header" => {
                if self.road.is_none() {
                    self.network.name = attrs.text("name").map(str::to_string);
                }
            }
            "road" => {
                self.road = Some(RoadSegment {
                    id: attrs.text("id").unwrap_or_default().to_string(),
                    junction: attrs.text("junction").map(str::to_string),
                    ..Default::default()
                });
            }
            _ if self.road.is_some() => self.open_in_road(tag, attrs)?,
            _ => {}
        }
        Ok(())
    }

    fn open_in_road(&mut self, tag: &str, attrs: &AttrMap) -> Result<()> {
        if self.lane.is_some() {
            return self.open_in_lane(tag, attrs);
        }

        match tag {
            "link" if self.section.is_none() => self.in_road_link = true,
            "predecessor" | "successor" if self.in_road_link => {
                let target = attrs.reference("elementId").map(|element_id| LinkTarget {
                    element_id,
                    element_type: attrs.text("elementType").map(str::to_string),
                });
                if let Some(road) = self.road.as_mut() {
                    if tag == "predecessor" {
                        road.link.predecessor = target;
                    } else {
                        road.link.successor = target;
                    }
                }
            }
            "geometry" => {
                self.geometry = Some(GeometryPrimitive {
                    s: attrs.f64_or(tag, "s", 0.0)?,
                    x: attrs.required_f64(tag, "x")?,
                    y: attrs.required_f64(tag, "y")?,
                    heading: attrs.f64_or(tag, "hdg", 0.0)?,
                    length: attrs.f64_or(tag, "length", 0.0)?,
                    kind: PrimitiveKind::Line,
                    elevation: None,
                });
            }
            "elevation" if self.geometry.is_some() => {
                let a = attrs.f64_or(tag, "a", 0.0)?;
                if let Some(geometry) = self.geometry.as_mut() {
                    geometry.elevation = Some(a);
                }
            }
            _ if self.geometry.is_some() => {
                if let (Some(kind), Some(geometry)) =
                    (PrimitiveKind::from_tag(tag), self.geometry.as_mut())
                {
                    geometry.kind = kind;
                }
            }
            "elevationProfile" => self.in_elevation_profile = true,
            "elevation" if self.in_elevation_profile => {
                let record = ElevationRecord {
                    s: attrs.f64_or(tag, "s", 0.0)?,
                    a: attrs.f64_or(tag, "a", 0.0)?,
                    b: attrs.f64_or(tag, "b", 0.0)?,
                    c: attrs.f64_or(tag, "c", 0.0)?,
                    d: attrs.f64_or(tag, "d", 0.0)?,
                };
                if let Some(road) = self.road.as_mut() {
                    road.elevation_profile.push(record);
                }
            }
            "lanes" => self.in_lanes = true,
            "laneOffset" if self.in_lanes && self.section.is_none() => {
                if !self.lane_offset_seen {
                    self.lane_offset_seen = true;
                    let a = attrs.f64_or(tag, "a", 0.0)?;
                    if let Some(road) = self.road.as_mut() {
                        road.lane_offset = a;
                    }
                }
            }
            "laneSection" if self.in_lanes => {
                self.section = Some(LaneSection {
                    s: attrs.f64_or(tag, "s", 0.0)?,
                    lanes: Vec::new(),
                });
            }
            "lane" if self.section.is_some() => {
                self.lane_width_seen = false;
                self.lane = Some(LaneRecord {
                    id: attrs.text("id").unwrap_or_default().to_string(),
                    lane_type: attrs.text("type").unwrap_or(DEFAULT_LANE_TYPE).to_string(),
                    width: None,
                    left_neighbor: attrs.reference("l_neighbor_id"),
                    right_neighbor: attrs.reference("r_neighbor_id"),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn open_in_lane(&mut self, tag: &str, attrs: &AttrMap) -> Result<()> {
        let Some(lane) = self.lane.as_mut() else {
            return Ok(());
        };

        match tag {
            "width" if !self.lane_width_seen => {
                self.lane_width_seen = true;
                lane.width = Some(attrs.f64_or(tag, "a", 0.0)?);
            }
            "neighbors" => {
                // <neighbors> hat Vorrang vor den Lane-Attributen
                if let Some(left) = normalize_reference(attrs.text("left")) {
                    lane.left_neighbor = Some(left);
                }
                if let Some(right) = normalize_reference(attrs.text("right")) {
                    lane.right_neighbor = Some(right);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, tag: &str) {
        match tag {
            "road" => {
                if let Some(road) = self.road.take() {
                    self.network.roads.push(road);
                }
                self.in_road_link = false;
                self.in_elevation_profile = false;
                self.in_lanes = false;
                self.lane_offset_seen = false;
            }
            "link" if self.lane.is_none() && self.section.is_none() => self.in_road_link = false,
            "geometry" => {
                if let (Some(geometry), Some(road)) = (self.geometry.take(), self.road.as_mut()) {
                    road.geometry.push(geometry);
                }
            }
            "elevationProfile" => self.in_elevation_profile = false,
            "lanes" => self.in_lanes = false,
            "lane" => {
                if let (Some(lane), Some(section)) = (self.lane.take(), self.section.as_mut()) {
                    section.lanes.push(lane);
                }
            }
            "laneSection" => {
                if let (Some(section), Some(road)) = (self.section.take(), self.road.as_mut()) {
                    road.lane_sections.push(section);
                }
            }
            _ => {}
        }
    }
}
