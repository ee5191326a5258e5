//! Map artifact accumulated over a run and rendered as a Leaflet HTML page.

use crate::config::toml_config::MapConfig;
use crate::core::route::HexColor;
use crate::domain::model::{Coordinate, RouteLine};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

const LEAFLET_VERSION: &str = "1.9.4";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: Coordinate,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub points: RouteLine,
    pub tooltip: String,
    pub color: HexColor,
    pub weight: u32,
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn from_points(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self {
            south: first.latitude,
            west: first.longitude,
            north: first.latitude,
            east: first.longitude,
        };
        for p in rest {
            bounds.extend(*p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: Coordinate) {
        self.south = self.south.min(p.latitude);
        self.north = self.north.max(p.latitude);
        self.west = self.west.min(p.longitude);
        self.east = self.east.max(p.longitude);
    }

    pub fn contains(&self, p: Coordinate) -> bool {
        (self.south..=self.north).contains(&p.latitude) && (self.west..=self.east).contains(&p.longitude)
    }
}

impl Serialize for Bounds {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // Leaflet LatLngBounds: [[south, west], [north, east]]
        [[self.south, self.west], [self.north, self.east]].serialize(serializer)
    }
}

/// Viewport fit applied when the page loads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportFit {
    pub bounds: Bounds,
    /// Pixels kept free around the bounds, `[x, y]`.
    pub padding: [u32; 2],
}

#[derive(Debug, Clone)]
pub struct MapArtifact {
    settings: MapConfig,
    markers: Vec<Marker>,
    polylines: Vec<Polyline>,
    fit: Option<ViewportFit>,
}

#[derive(Serialize)]
struct MapDocument<'a> {
    center: [f64; 2],
    zoom: u8,
    tiles: &'a str,
    attribution: &'a str,
    markers: Vec<Marker>,
    polylines: Vec<Polyline>,
    fit: Option<ViewportFit>,
}

impl MapArtifact {
    pub fn new(settings: MapConfig) -> Self {
        Self {
            settings,
            markers: Vec::new(),
            polylines: Vec::new(),
            fit: None,
        }
    }

    pub fn add_marker(&mut self, position: Coordinate, tooltip: impl Into<String>) {
        self.markers.push(Marker {
            position,
            tooltip: tooltip.into(),
        });
    }

    pub fn add_polyline(&mut self, points: RouteLine, tooltip: impl Into<String>, color: HexColor) {
        self.polylines.push(Polyline {
            points,
            tooltip: tooltip.into(),
            color,
            weight: self.settings.line_weight,
        });
    }

    /// No-op for an empty point set.
    pub fn fit_bounds(&mut self, points: &[Coordinate]) {
        self.fit = Bounds::from_points(points).map(|bounds| ViewportFit {
            bounds,
            padding: self.settings.fit_padding,
        });
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn fit(&self) -> Option<&ViewportFit> {
        self.fit.as_ref()
    }

    pub fn render_html(&self, generated_at: DateTime<Utc>) -> Result<String> {
        let document = MapDocument {
            center: self.settings.center,
            zoom: self.settings.zoom,
            tiles: &self.settings.tiles,
            attribution: &self.settings.attribution,
            markers: self
                .markers
                .iter()
                .map(|m| Marker {
                    position: m.position,
                    tooltip: escape_html(&m.tooltip),
                })
                .collect(),
            polylines: self
                .polylines
                .iter()
                .map(|l| Polyline {
                    tooltip: escape_html(&l.tooltip),
                    ..l.clone()
                })
                .collect(),
            fit: self.fit,
        };
        // 避免資料中的 </script> 提早結束 script 區塊
        let payload = serde_json::to_string(&document)?.replace("</", "<\\/");

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<meta name="generated" content="{generated}"/>
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.css"/>
<script src="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; width: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const data = {payload};
const map = L.map("map").setView(data.center, data.zoom);
L.tileLayer(data.tiles, {{ attribution: data.attribution, maxZoom: 19 }}).addTo(map);
data.markers.forEach(function (m) {{
  L.marker(m.position).bindTooltip(m.tooltip).addTo(map);
}});
data.polylines.forEach(function (l) {{
  L.polyline(l.points, {{ color: l.color, weight: l.weight }}).bindTooltip(l.tooltip).addTo(map);
}});
if (data.fit) {{
  map.fitBounds(data.fit.bounds, {{ padding: data.fit.padding }});
}}
</script>
</body>
</html>
"#,
            generated = generated_at.to_rfc3339(),
            title = escape_html(&self.settings.title),
            leaflet = LEAFLET_VERSION,
            payload = payload,
        ))
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
