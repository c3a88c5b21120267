use serde::{Deserialize, Serialize};

/// WGS84 position in decimal degrees; altitude in metres when known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub alt: Option<f64>,
    pub desc: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCounters {
    pub total: usize,
    pub with_gps: usize,
    pub skipped: usize,
}
