//! Geospatial providers
//!
//! A provider only knows how to phrase the query and how to read the answer;
//! sending, status handling and truncation live in the locator.

use crate::spot::SafeSpot;
use crate::LocateError;
use actuator_link::Position;
use serde::Deserialize;

/// Amenity tags searched on OpenStreetMap
pub const OSM_AMENITIES: &[&str] = &["parking", "fuel", "police", "rest_area", "hospital"];

/// Place types searched on the commercial places API
pub const PLACES_TYPES: &[&str] = &["gas_station", "parking", "police", "hospital"];

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass.kumi.systems/api/interpreter";
pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Source of nearby amenities
pub trait SpotProvider: Send + Sync {
    /// Short name for logs and metric labels
    fn name(&self) -> &'static str;

    /// Build the HTTP request for a search around `position`
    fn request(
        &self,
        client: &reqwest::Client,
        position: Position,
        radius_m: u32,
    ) -> reqwest::RequestBuilder;

    /// Parse a successful response body, preserving provider order
    fn parse(&self, body: &str) -> Result<Vec<SafeSpot>, LocateError>;
}

/// OpenStreetMap amenity search through an Overpass interpreter
#[derive(Debug, Clone)]
pub struct OverpassProvider {
    url: String,
    timeout_secs: u64,
}

impl OverpassProvider {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            url: url.into(),
            timeout_secs,
        }
    }

    /// Overpass QL for nodes and ways carrying one of the safe amenities.
    ///
    /// ```text
    /// [out:json][timeout:25];
    /// (
    ///   node["amenity"~"parking|fuel|..."](around:5000,lat,lng);
    ///   way["amenity"~"parking|fuel|..."](around:5000,lat,lng);
    /// );
    /// out center;
    /// ```
    pub fn build_query(&self, position: Position, radius_m: u32) -> String {
        let filter = format!("[\"amenity\"~\"{}\"]", OSM_AMENITIES.join("|"));
        let around = format!("(around:{},{},{})", radius_m, position.lat, position.lng);
        format!(
            "[out:json][timeout:{}];\n(\n  node{filter}{around};\n  way{filter}{around};\n);\nout center;",
            self.timeout_secs,
        )
    }
}

impl Default for OverpassProvider {
    fn default() -> Self {
        Self::new(DEFAULT_OVERPASS_URL, 25)
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: OverpassTags,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
}

#[derive(Debug, Default, Deserialize)]
struct OverpassTags {
    amenity: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

impl SpotProvider for OverpassProvider {
    fn name(&self) -> &'static str {
        "overpass"
    }

    fn request(
        &self,
        client: &reqwest::Client,
        position: Position,
        radius_m: u32,
    ) -> reqwest::RequestBuilder {
        client
            .get(&self.url)
            .query(&[("data", self.build_query(position, radius_m))])
    }

    fn parse(&self, body: &str) -> Result<Vec<SafeSpot>, LocateError> {
        let response: OverpassResponse =
            serde_json::from_str(body).map_err(|e| LocateError::Parse(e.to_string()))?;

        Ok(response
            .elements
            .into_iter()
            .map(|element| {
                let position = match (element.lat, element.lon, element.center) {
                    (Some(lat), Some(lon), _) => Some(Position::new(lat, lon)),
                    (_, _, Some(center)) => Some(Position::new(center.lat, center.lon)),
                    _ => None,
                };
                SafeSpot::from_tags(element.tags.amenity.as_deref(), element.tags.name.as_deref())
                    .with_position(position)
            })
            .collect())
    }
}

/// Commercial nearby-search places API
#[derive(Debug, Clone)]
pub struct PlacesProvider {
    url: String,
    api_key: String,
}

impl PlacesProvider {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    results: Vec<PlacesResult>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlacesResult {
    name: Option<String>,
    vicinity: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    geometry: Option<PlacesGeometry>,
}

#[derive(Debug, Deserialize)]
struct PlacesGeometry {
    location: PlacesLocation,
}

#[derive(Debug, Deserialize)]
struct PlacesLocation {
    lat: f64,
    lng: f64,
}

impl SpotProvider for PlacesProvider {
    fn name(&self) -> &'static str {
        "places"
    }

    fn request(
        &self,
        client: &reqwest::Client,
        position: Position,
        radius_m: u32,
    ) -> reqwest::RequestBuilder {
        client.get(&self.url).query(&[
            ("location", format!("{},{}", position.lat, position.lng)),
            ("radius", radius_m.to_string()),
            ("type", PLACES_TYPES.join("|")),
            ("key", self.api_key.clone()),
        ])
    }

    fn parse(&self, body: &str) -> Result<Vec<SafeSpot>, LocateError> {
        let response: PlacesResponse =
            serde_json::from_str(body).map_err(|e| LocateError::Parse(e.to_string()))?;

        // The API reports quota and key problems with HTTP 200
        match response.status.as_deref() {
            None | Some("OK") | Some("ZERO_RESULTS") => {}
            Some(status) => {
                return Err(LocateError::Provider(format!(
                    "{}{}",
                    status,
                    response
                        .error_message
                        .map(|m| format!(": {}", m))
                        .unwrap_or_default()
                )))
            }
        }

        Ok(response
            .results
            .into_iter()
            .map(|place| {
                SafeSpot::from_tags(place.types.first().map(String::as_str), place.name.as_deref())
                    .with_vicinity(place.vicinity)
                    .with_position(
                        place
                            .geometry
                            .map(|g| Position::new(g.location.lat, g.location.lng)),
                    )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query() {
        let provider = OverpassProvider::default();
        let query = provider.build_query(Position::new(12.97, 77.59), 5000);

        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains("node[\"amenity\"~\"parking|fuel|police|rest_area|hospital\"](around:5000,12.97,77.59);"));
        assert!(query.contains("way[\"amenity\"~\"parking|fuel|police|rest_area|hospital\"](around:5000,12.97,77.59);"));
        assert!(query.ends_with("out center;"));
    }

    #[test]
    fn test_overpass_request_carries_query() {
        let provider = OverpassProvider::new("http://localhost:1/api/interpreter", 10);
        let client = reqwest::Client::new();
        let request = provider
            .request(&client, Position::new(1.5, 2.5), 3000)
            .build()
            .unwrap();
        let query = request.url().query().unwrap_or_default().to_string();
        assert!(query.starts_with("data="));
        assert!(query.contains("around%3A3000%2C1.5%2C2.5"));
    }

    #[test]
    fn test_parse_overpass() {
        let body = r#"{"elements": [
            {"type": "node", "lat": 12.0, "lon": 77.0, "tags": {"amenity": "fuel", "name": "Shell"}},
            {"type": "way", "center": {"lat": 12.1, "lon": 77.1}, "tags": {"amenity": "rest_area"}},
            {"type": "node", "lat": 12.2, "lon": 77.2}
        ]}"#;
        let spots = OverpassProvider::default().parse(body).unwrap();

        assert_eq!(spots.len(), 3);
        assert_eq!(spots[0].category, "FUEL");
        assert_eq!(spots[0].name, "Shell");
        assert_eq!(spots[0].position, Some(Position::new(12.0, 77.0)));
        assert_eq!(spots[1].name, "Nearby REST AREA");
        assert_eq!(spots[1].position, Some(Position::new(12.1, 77.1)));
        assert_eq!(spots[2].category, "SAFE SPOT");
    }

    #[test]
    fn test_parse_overpass_garbage() {
        let provider = OverpassProvider::default();
        assert!(matches!(provider.parse("<html>busy</html>"), Err(LocateError::Parse(_))));
        assert!(matches!(provider.parse("{}"), Err(LocateError::Parse(_))));
    }

    #[test]
    fn test_places_request() {
        let provider = PlacesProvider::new("http://localhost:1/nearby", "secret");
        let client = reqwest::Client::new();
        let request = provider
            .request(&client, Position::new(1.5, 2.5), 5000)
            .build()
            .unwrap();
        let query = request.url().query().unwrap_or_default().to_string();
        assert!(query.contains("location=1.5%2C2.5"));
        assert!(query.contains("radius=5000"));
        assert!(query.contains("type=gas_station%7Cparking%7Cpolice%7Chospital"));
        assert!(query.contains("key=secret"));
    }

    #[test]
    fn test_parse_places() {
        let body = r#"{"status": "OK", "results": [
            {"name": "HP Petrol", "vicinity": "Ring Rd", "types": ["gas_station", "point_of_interest"],
             "geometry": {"location": {"lat": 12.0, "lng": 77.0}}},
            {"name": "Lot 4", "types": []}
        ]}"#;
        let spots = PlacesProvider::new("", "k").parse(body).unwrap();
        assert_eq!(spots[0].category, "GAS STATION");
        assert_eq!(spots[0].vicinity.as_deref(), Some("Ring Rd"));
        assert_eq!(spots[1].category, "SAFE SPOT");
    }

    #[test]
    fn test_parse_places_denied() {
        let body = r#"{"status": "REQUEST_DENIED", "error_message": "bad key", "results": []}"#;
        let err = PlacesProvider::new("", "k").parse(body).unwrap_err();
        assert!(matches!(err, LocateError::Provider(ref m) if m == "REQUEST_DENIED: bad key"));
    }

    #[test]
    fn test_parse_places_zero_results() {
        let body = r#"{"status": "ZERO_RESULTS", "results": []}"#;
        assert!(PlacesProvider::new("", "k").parse(body).unwrap().is_empty());
    }
}
