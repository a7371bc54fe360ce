//! Google Maps tool - proxies geocoding, directions, and places lookups
//! against the Google Maps Platform APIs.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::core::config::CredentialsConfig;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::Parameters;
use crate::domains::tools::spec::{ActionSpec, ParamType, Tool};

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const NEARBY_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const PLACE_DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

/// Fields requested for place-details lookups.
const PLACE_DETAILS_FIELDS: &str = "name,rating,formatted_address,geometry,photo,opening_hours,price_level,website,formatted_phone_number";

/// Thin client over the Google Maps Platform APIs. The API key travels as
/// a query parameter on every call.
#[derive(Debug, Clone)]
pub struct GmapsClient {
    http: Client,
    api_key: String,
}

impl GmapsClient {
    pub fn new(credentials: &CredentialsConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: credentials.gmaps_api_key.clone().unwrap_or_default(),
        }
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ToolError> {
        debug!("Google Maps GET {}", url);
        let response = self
            .http
            .get(url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ToolError::backend_status(
                status.as_u16(),
                format!("Google Maps API error: {}", body),
            ));
        }
        serde_json::from_str(&body).map_err(|e| {
            ToolError::backend(format!("Google Maps API returned malformed JSON: {}", e))
        })
    }

    /// Convert an address to geographic coordinates.
    pub async fn geocode(&self, params: Parameters) -> Result<Value, ToolError> {
        let address = params.require_str("address")?;
        self.get(GEOCODE_URL, &[("address", address)]).await
    }

    /// Convert geographic coordinates to an address.
    pub async fn reverse_geocode(&self, params: Parameters) -> Result<Value, ToolError> {
        let lat = params
            .number_as_string("lat")
            .ok_or_else(|| ToolError::missing_parameter("lat"))?;
        let lng = params
            .number_as_string("lng")
            .ok_or_else(|| ToolError::missing_parameter("lng"))?;
        let latlng = format!("{},{}", lat, lng);
        self.get(GEOCODE_URL, &[("latlng", latlng.as_str())]).await
    }

    /// Get directions between two locations.
    pub async fn get_directions(&self, params: Parameters) -> Result<Value, ToolError> {
        let origin = params.require_str("origin")?;
        let destination = params.require_str("destination")?;
        let mode = params.str_opt("mode").unwrap_or("driving");
        self.get(
            DIRECTIONS_URL,
            &[
                ("origin", origin),
                ("destination", destination),
                ("mode", mode),
            ],
        )
        .await
    }

    /// Search for places, either by free-text query or by location + type.
    pub async fn search_places(&self, params: Parameters) -> Result<Value, ToolError> {
        let query = params.str_opt("query").filter(|q| !q.is_empty());
        let location = params.str_opt("location").filter(|l| !l.is_empty());
        let place_type = params.str_opt("type").filter(|t| !t.is_empty());

        if let Some(query) = query {
            return self.get(TEXT_SEARCH_URL, &[("query", query)]).await;
        }

        match (location, place_type) {
            (Some(location), Some(place_type)) => {
                let radius = params.u64_or("radius", 1000).to_string();
                self.get(
                    NEARBY_SEARCH_URL,
                    &[
                        ("location", location),
                        ("radius", radius.as_str()),
                        ("type", place_type),
                    ],
                )
                .await
            }
            _ => Err(ToolError::invalid_parameters(
                "Either 'query' or 'location' with 'type' parameters are required",
            )),
        }
    }

    /// Get details for a specific place.
    pub async fn get_place_details(&self, params: Parameters) -> Result<Value, ToolError> {
        let place_id = params.require_str("placeId")?;
        self.get(
            PLACE_DETAILS_URL,
            &[("place_id", place_id), ("fields", PLACE_DETAILS_FIELDS)],
        )
        .await
    }
}

/// The `gmaps` tool.
pub struct GmapsTool {
    client: GmapsClient,
}

impl GmapsTool {
    pub const NAME: &'static str = "gmaps";

    pub fn new(credentials: &CredentialsConfig) -> Self {
        Self {
            client: GmapsClient::new(credentials),
        }
    }
}

impl Tool for GmapsTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec::builder("geocode", "Convert an address to geographic coordinates")
                .required("address", ParamType::String, "Address to geocode")
                .returns("object", "Geocoding results")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.geocode(params).await }
                    }
                }),
            ActionSpec::builder(
                "reverseGeocode",
                "Convert geographic coordinates to an address",
            )
            .required("lat", ParamType::Number, "Latitude")
            .required("lng", ParamType::Number, "Longitude")
            .returns("object", "Reverse geocoding results")
            .handler({
                let client = self.client.clone();
                move |params| {
                    let client = client.clone();
                    async move { client.reverse_geocode(params).await }
                }
            }),
            ActionSpec::builder("getDirections", "Get directions between two locations")
                .required("origin", ParamType::String, "Origin address or coordinates")
                .required(
                    "destination",
                    ParamType::String,
                    "Destination address or coordinates",
                )
                .with_default(
                    "mode",
                    ParamType::String,
                    "Travel mode (driving, walking, bicycling, transit)",
                    json!("driving"),
                )
                .returns("object", "Directions results")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.get_directions(params).await }
                    }
                }),
            ActionSpec::builder("searchPlaces", "Search for places")
                .optional("query", ParamType::String, "Free-text search query")
                .optional(
                    "location",
                    ParamType::String,
                    "Latitude,longitude pair for nearby search",
                )
                .optional("type", ParamType::String, "Place type for nearby search")
                .with_default(
                    "radius",
                    ParamType::Number,
                    "Nearby search radius in meters",
                    json!(1000),
                )
                .returns("object", "Place search results")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.search_places(params).await }
                    }
                }),
            ActionSpec::builder("getPlaceDetails", "Get details for a specific place")
                .required("placeId", ParamType::String, "Google Maps place ID")
                .returns("object", "Place details")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.get_place_details(params).await }
                    }
                }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GmapsClient {
        GmapsClient::new(&CredentialsConfig::default())
    }

    #[test]
    fn test_action_names() {
        let tool = GmapsTool::new(&CredentialsConfig::default());
        let names: Vec<_> = tool.actions().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "geocode",
                "reverseGeocode",
                "getDirections",
                "searchPlaces",
                "getPlaceDetails"
            ]
        );
    }

    #[tokio::test]
    async fn test_geocode_requires_address() {
        let err = test_client().geocode(Parameters::new()).await.unwrap_err();
        assert!(err.to_string().contains("address"));
    }

    #[tokio::test]
    async fn test_reverse_geocode_requires_both_coordinates() {
        let params = Parameters::from_value(json!({"lat": 48.85}));
        let err = test_client().reverse_geocode(params).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidParameters");
        assert!(err.to_string().contains("lng"));
    }

    #[tokio::test]
    async fn test_search_places_needs_query_or_location_and_type() {
        // location without type is not enough
        let params = Parameters::from_value(json!({"location": "48.85,2.35"}));
        let err = test_client().search_places(params).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidParameters");
    }
}
