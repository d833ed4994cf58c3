//! Data access for the IMA-SC bathing-water (balneabilidade) API.
//!
//! Municipalities, their monitoring locations and the collection points of
//! each location are fetched one level at a time, on demand. Every call is
//! a single POST round trip with no caching.

pub mod error;
pub mod http;
pub mod maps;
pub mod repo;
pub mod types;

pub use error::{ClientError, RepoError, RequestError, DEFAULT_ERROR_MESSAGE};
pub use http::{create_client, HttpClient, HttpOptions, RawBody, RequestBody, Transport};
pub use maps::{nearest_beach_links, Platform};
pub use repo::{
    fetch_analyzed_years, fetch_locations_by_municipality, fetch_municipalities,
    fetch_points_by_location, normalize_body, Repository,
};
pub use types::{CollectionPoint, Condition, Coordinates, MonitoringLocation, Municipality};
