// Map view data for the geographic mode.
//
// Rendering happens elsewhere; this module only decides where the map is
// centered and how large each marker is, and writes the result as GeoJSON.
use crate::error::QueryError;
use crate::types::{Column, Mode, Table};
use crate::util::{average, format_number};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub customer: String,
    pub sales: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Circle radius in map pixels.
    pub radius: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub markers: Vec<MapMarker>,
}

/// Marker radius grows with the square root of sales.
pub fn marker_radius(sales: f64) -> f64 {
    sales.max(0.0).sqrt() / 100.0
}

pub fn map_view(table: &Table) -> Result<MapView, QueryError> {
    if table.mode() != Mode::Geographic {
        return Err(QueryError::NotAvailable {
            what: "map",
            mode: table.mode(),
        });
    }
    if table.is_empty() {
        return Err(QueryError::NoData);
    }

    let markers: Vec<MapMarker> = table
        .records()
        .iter()
        .filter_map(|r| {
            let sales = r.get(Column::Sales)?;
            Some(MapMarker {
                customer: r.customer.clone(),
                sales,
                latitude: r.get(Column::Latitude)?,
                longitude: r.get(Column::Longitude)?,
                radius: marker_radius(sales),
                tooltip: format!("{}: {}", r.customer, format_number(sales, 0)),
            })
        })
        .collect();

    let lats: Vec<f64> = markers.iter().map(|m| m.latitude).collect();
    let lons: Vec<f64> = markers.iter().map(|m| m.longitude).collect();
    Ok(MapView {
        center_latitude: average(&lats),
        center_longitude: average(&lons),
        markers,
    })
}

impl MapView {
    /// GeoJSON FeatureCollection with one point per customer. The map center
    /// rides along as a foreign member.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .markers
            .iter()
            .map(|m| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [m.longitude, m.latitude],
                    },
                    "properties": {
                        "customer": m.customer,
                        "sales": m.sales,
                        "radius": m.radius,
                        "heat_weight": m.sales,
                        "tooltip": m.tooltip,
                    },
                })
            })
            .collect();
        json!({
            "type": "FeatureCollection",
            "center": [self.center_longitude, self.center_latitude],
            "features": features,
        })
    }
}
