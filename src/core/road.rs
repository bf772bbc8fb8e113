//! Geparstes OpenDRIVE-Straßennetz: Straßen, Geometrie-Primitive, Spuren.

use glam::DVec2;

/// Spurtyp, der standardmäßig als befahrbar gilt.
pub const LANE_TYPE_DRIVING: &str = "driving";

/// Alle Straßen eines OpenDRIVE-Dokuments in Dokumentreihenfolge.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    /// Name aus dem `<header>` (optional)
    pub name: Option<String>,
    /// Alle Straßen in Dokumentreihenfolge
    pub roads: Vec<RoadSegment>,
}

impl RoadNetwork {
    /// Anzahl aller Geometrie-Primitive über alle Straßen.
    pub fn primitive_count(&self) -> usize {
        self.roads.iter().map(|r| r.geometry.len()).sum()
    }

    /// Anzahl aller Spur-Records über alle Straßen und Lane-Sections.
    pub fn lane_count(&self) -> usize {
        self.roads.iter().map(|r| r.lanes().count()).sum()
    }
}

/// Eine Straße mit Referenzlinie, Spuren und Verknüpfungen.
#[derive(Debug, Clone, Default)]
pub struct RoadSegment {
    /// Straßen-ID aus dem Attribut `id`
    pub id: String,
    /// Junction-ID (`-1` = keine Kreuzung)
    pub junction: Option<String>,
    /// Referenzlinie als geordnete Folge von Primitiven
    pub geometry: Vec<GeometryPrimitive>,
    /// Höhenprofil (`<elevationProfile>`)
    pub elevation_profile: Vec<ElevationRecord>,
    /// Konstanter Anteil des ersten `<laneOffset>` (0 wenn nicht vorhanden)
    pub lane_offset: f64,
    /// Lane-Sections in Dokumentreihenfolge
    pub lane_sections: Vec<LaneSection>,
    /// Vorgänger/Nachfolger auf Straßenebene
    pub link: RoadLink,
}

impl RoadSegment {
    /// Iterator über alle Spuren aller Lane-Sections.
    pub fn lanes(&self) -> impl Iterator<Item = &LaneRecord> {
        self.lane_sections.iter().flat_map(|section| section.lanes.iter())
    }

    /// Prüft ob die Straße Teil einer Kreuzung ist.
    pub fn is_intersection(&self) -> bool {
        self.junction
            .as_deref()
            .is_some_and(|j| !j.is_empty() && j != "-1")
    }

    /// Ermittelt die (konstante) Höhe für ein Primitiv.
    ///
    /// Reihenfolge: eigenes `<elevation>` des Primitivs, sonst der letzte
    /// Profil-Eintrag mit `s <= primitive.s`, ausgewertet am Primitiv-Start.
    pub fn elevation_for(&self, primitive: &GeometryPrimitive) -> Option<f64> {
        if let Some(elevation) = primitive.elevation {
            return Some(elevation);
        }

        self.elevation_profile
            .iter()
            .filter(|record| record.s <= primitive.s)
            .max_by(|a, b| a.s.total_cmp(&b.s))
            .map(|record| record.evaluate(primitive.s))
    }
}

/// Art des Geometrie-Primitivs. Wird nur mitgeführt; gezeichnet wird immer
/// eine Gerade mit fester Richtung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveKind {
    #[default]
    Line,
    Arc,
    Spiral,
    Poly3,
    ParamPoly3,
}

impl PrimitiveKind {
    /// Ordnet einen XML-Tag-Namen zu.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "line" => Some(Self::Line),
            "arc" => Some(Self::Arc),
            "spiral" => Some(Self::Spiral),
            "poly3" => Some(Self::Poly3),
            "paramPoly3" => Some(Self::ParamPoly3),
            _ => None,
        }
    }
}

/// Pose der Referenzlinie am Beginn eines Primitivs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryPrimitive {
    /// Bogenlänge des Primitiv-Starts entlang der Straße
    pub s: f64,
    pub x: f64,
    pub y: f64,
    /// Richtung in Radiant
    pub heading: f64,
    pub length: f64,
    pub kind: PrimitiveKind,
    /// Konstante Höhe aus einem verschachtelten `<elevation a>` (optional)
    pub elevation: Option<f64>,
}

impl GeometryPrimitive {
    /// Erstellt eine Gerade ohne eigene Höhe.
    pub fn line(x: f64, y: f64, heading: f64, length: f64) -> Self {
        Self {
            s: 0.0,
            x,
            y,
            heading,
            length,
            kind: PrimitiveKind::Line,
            elevation: None,
        }
    }

    /// Startpunkt in Weltkoordinaten.
    pub fn start(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Einheitsvektor in Fahrtrichtung.
    pub fn direction(&self) -> DVec2 {
        DVec2::from_angle(self.heading)
    }

    /// Einheitsvektor quer zur Fahrtrichtung (`(sin h, -cos h)`, zeigt nach rechts).
    pub fn lateral(&self) -> DVec2 {
        DVec2::new(self.heading.sin(), -self.heading.cos())
    }

    /// Punkt auf der Referenzlinie nach Bogenlänge `ds`.
    pub fn point_at(&self, ds: f64) -> DVec2 {
        self.start() + self.direction() * ds
    }

    /// Endpunkt (gerade Verlängerung um `length`).
    pub fn end(&self) -> DVec2 {
        self.point_at(self.length)
    }
}

/// Eintrag des Höhenprofils: `a + b*ds + c*ds^2 + d*ds^3`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElevationRecord {
    pub s: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl ElevationRecord {
    /// Wertet das Polynom an der Bogenlänge `s` aus.
    pub fn evaluate(&self, s: f64) -> f64 {
        let ds = s - self.s;
        self.a + ds * (self.b + ds * (self.c + ds * self.d))
    }
}

/// Gruppe von Spuren mit gemeinsamem Startpunkt `s`.
#[derive(Debug, Clone, Default)]
pub struct LaneSection {
    pub s: f64,
    /// Spuren in Dokumentreihenfolge (left, center, right)
    pub lanes: Vec<LaneRecord>,
}

/// Einzelne Spur mit konstanter Breite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneRecord {
    /// Spur-ID aus dem Attribut `id` (z.B. `-1`, `0`, `2`)
    pub id: String,
    /// Spurtyp, fehlend = `driving`
    pub lane_type: String,
    /// `a`-Koeffizient des ersten `<width>` (None wenn kein `<width>`)
    pub width: Option<f64>,
    pub left_neighbor: Option<String>,
    pub right_neighbor: Option<String>,
}

impl LaneRecord {
    /// Erstellt eine Fahrspur mit gegebener Breite.
    pub fn driving(id: &str, width: f64) -> Self {
        Self {
            id: id.to_string(),
            lane_type: LANE_TYPE_DRIVING.to_string(),
            width: Some(width),
            left_neighbor: None,
            right_neighbor: None,
        }
    }

    /// Breite oder 0, wenn kein `<width>` angegeben ist.
    pub fn width_or_zero(&self) -> f64 {
        self.width.unwrap_or(0.0)
    }
}

/// Verknüpfung einer Straße mit Vorgänger und Nachfolger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadLink {
    pub predecessor: Option<LinkTarget>,
    pub successor: Option<LinkTarget>,
}

/// Ziel einer Straßenverknüpfung.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTarget {
    /// `elementId` (Straßen- oder Junction-ID)
    pub element_id: String,
    /// `elementType` (`road` oder `junction`), optional
    pub element_type: Option<String>,
}
