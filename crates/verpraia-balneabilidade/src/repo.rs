//! Repository operations, one per upstream endpoint.
//!
//! The free functions take the [`Transport`] to use for that call; a
//! [`Repository`] bundles a shared transport for the common case.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::{ClientError, RepoError};
use crate::http::{create_client, HttpOptions, RawBody, RequestBody, Transport, FORM_CONTENT_TYPE};
use crate::types::{AnalyzedYearRecord, CollectionPoint, MonitoringLocation, Municipality};

pub const MUNICIPALITIES_PATH: &str = "/municipio/getMunicipios";
pub const LOCATIONS_BY_MUNICIPALITY_PATH: &str = "/local/getLocaisByMunicipio";
pub const POINTS_BY_LOCATION_PATH: &str = "/pontoColeta/getPontosByLocal";
pub const ANALYZED_YEARS_PATH: &str = "/registro/anosAnalisados";

/// Decode a response body into `T`.
///
/// Text is parsed as a JSON document; an already-parsed value is converted
/// directly. Decode failures are returned as-is.
pub fn normalize_body<T: DeserializeOwned>(raw: RawBody) -> Result<T, serde_json::Error> {
    match raw {
        RawBody::Text(text) => serde_json::from_str(&text),
        RawBody::Json(value) => serde_json::from_value(value),
    }
}

fn form_request(field: &str, value: String) -> (RequestBody, HeaderMap) {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    (RequestBody::form([(field, value)]), headers)
}

/// List every monitored municipality, in upstream order.
#[instrument(skip(client), level = "info")]
pub async fn fetch_municipalities(
    client: &dyn Transport,
) -> Result<Vec<Municipality>, RepoError> {
    let raw = client.post(MUNICIPALITIES_PATH, None, None).await?;
    let municipalities: Vec<Municipality> = normalize_body(raw)?;
    tracing::debug!(count = municipalities.len(), "Fetched municipalities");
    Ok(municipalities)
}

/// List the monitoring locations of one municipality.
#[instrument(skip(client), level = "info")]
pub async fn fetch_locations_by_municipality(
    client: &dyn Transport,
    municipality_code: &str,
) -> Result<Vec<MonitoringLocation>, RepoError> {
    let (body, headers) = form_request("municipioID", municipality_code.to_string());
    let raw = client
        .post(LOCATIONS_BY_MUNICIPALITY_PATH, Some(body), Some(headers))
        .await?;
    let locations: Vec<MonitoringLocation> = normalize_body(raw)?;
    tracing::debug!(count = locations.len(), "Fetched monitoring locations");
    Ok(locations)
}

/// List the collection points of one monitoring location.
#[instrument(skip(client), level = "info")]
pub async fn fetch_points_by_location(
    client: &dyn Transport,
    location_code: i64,
) -> Result<Vec<CollectionPoint>, RepoError> {
    let (body, headers) = form_request("localID", location_code.to_string());
    let raw = client
        .post(POINTS_BY_LOCATION_PATH, Some(body), Some(headers))
        .await?;
    let points: Vec<CollectionPoint> = normalize_body(raw)?;
    tracing::debug!(count = points.len(), "Fetched collection points");
    Ok(points)
}

/// Years with historical monitoring data, in upstream order.
#[instrument(skip(client), level = "info")]
pub async fn fetch_analyzed_years(client: &dyn Transport) -> Result<Vec<i32>, RepoError> {
    let raw = client.post(ANALYZED_YEARS_PATH, None, None).await?;
    let records: Vec<AnalyzedYearRecord> = normalize_body(raw)?;
    tracing::debug!(count = records.len(), "Fetched analyzed years");
    Ok(records.into_iter().map(|r| r.year).collect())
}

/// Repository bound to one shared transport.
///
/// Build it once at startup and clone it wherever it is needed; clones share
/// the transport. Pass a different transport to the free functions when a
/// call needs isolation.
#[derive(Clone)]
pub struct Repository {
    transport: Arc<dyn Transport>,
}

impl Repository {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a repository over a fresh [`HttpClient`](crate::http::HttpClient).
    ///
    /// # Errors
    /// See [`create_client`].
    pub fn from_options(options: HttpOptions) -> Result<Self, ClientError> {
        let client = create_client(options)?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub async fn fetch_municipalities(&self) -> Result<Vec<Municipality>, RepoError> {
        fetch_municipalities(self.transport()).await
    }

    pub async fn fetch_locations_by_municipality(
        &self,
        municipality_code: &str,
    ) -> Result<Vec<MonitoringLocation>, RepoError> {
        fetch_locations_by_municipality(self.transport(), municipality_code).await
    }

    pub async fn fetch_points_by_location(
        &self,
        location_code: i64,
    ) -> Result<Vec<CollectionPoint>, RepoError> {
        fetch_points_by_location(self.transport(), location_code).await
    }

    pub async fn fetch_analyzed_years(&self) -> Result<Vec<i32>, RepoError> {
        fetch_analyzed_years(self.transport()).await
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RequestError, DEFAULT_ERROR_MESSAGE};
    use crate::types::Condition;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct RecordedCall {
        path: String,
        body: Option<RequestBody>,
        headers: Option<HeaderMap>,
    }

    /// Transport that answers every call with the same canned result.
    struct FakeTransport {
        response: Result<RawBody, RequestError>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl FakeTransport {
        fn ok(raw: RawBody) -> Self {
            Self {
                response: Ok(raw),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: RequestError) -> Self {
            Self {
                response: Err(err),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn post(
            &self,
            path: &str,
            body: Option<RequestBody>,
            headers: Option<HeaderMap>,
        ) -> Result<RawBody, RequestError> {
            self.calls.lock().unwrap().push(RecordedCall {
                path: path.to_string(),
                body,
                headers,
            });
            self.response.clone()
        }
    }

    fn municipalities_json() -> Value {
        json!([
            {"CODIGO": "417020", "DESCRICAO": "Florianópolis", "EMAIL": "pmf@pmf.sc.gov.br", "IBGE": "4205407"},
            {"CODIGO": "417010", "DESCRICAO": "Bombinhas"}
        ])
    }

    fn locations_json() -> Value {
        json!([
            {"CODIGO": 31, "LATITUDE": "-27.4384", "LONGITUDE": "-48.4964", "BALNEARIO": "Jurerê"},
            {"CODIGO": 32, "LATITUDE": "-27.5950", "LONGITUDE": "-48.4330", "BALNEARIO": "Joaquina"}
        ])
    }

    fn points_json() -> Value {
        json!([
            {"LOCALIZACAO": "Em frente à Rua das Gaivotas", "CONDICAO": "PRÓPRIO"},
            {"LOCALIZACAO": "Próximo ao rio", "CONDICAO": "IMPRÓPRIO"},
            {"LOCALIZACAO": "Canto norte", "CONDICAO": "MEDIÇÃO NÃO REALIZADA"}
        ])
    }

    fn years_json() -> Value {
        json!([{"ANO": 2024}, {"ANO": 2019}, {"ANO": 2024}, {"ANO": 2021}])
    }

    fn both_encodings(value: Value) -> (FakeTransport, FakeTransport) {
        (
            FakeTransport::ok(RawBody::Text(value.to_string())),
            FakeTransport::ok(RawBody::Json(value)),
        )
    }

    #[test]
    fn test_normalize_body_text_and_value_agree() {
        let text: Vec<i32> = normalize_body(RawBody::Text("[1,2,3]".to_string())).unwrap();
        let value: Vec<i32> = normalize_body(RawBody::Json(json!([1, 2, 3]))).unwrap();
        assert_eq!(text, value);
    }

    #[test]
    fn test_normalize_body_malformed_text() {
        let result: Result<Vec<i32>, _> = normalize_body(RawBody::Text("[1,2".to_string()));
        assert!(result.unwrap_err().is_eof());
    }

    #[tokio::test]
    async fn test_municipalities_decode_matches_pass_through() {
        let (text, value) = both_encodings(municipalities_json());

        let from_text = fetch_municipalities(&text).await.unwrap();
        let from_value = fetch_municipalities(&value).await.unwrap();

        assert_eq!(from_text, from_value);
        assert_eq!(from_text.len(), 2);
        assert_eq!(from_text[0].ibge.as_deref(), Some("4205407"));
        assert_eq!(from_text[1].description, "Bombinhas");
        assert_eq!(text.calls()[0].path, MUNICIPALITIES_PATH);
        assert!(text.calls()[0].body.is_none());
    }

    #[tokio::test]
    async fn test_locations_decode_matches_pass_through() {
        let (text, value) = both_encodings(locations_json());

        let from_text = fetch_locations_by_municipality(&text, "417020").await.unwrap();
        let from_value = fetch_locations_by_municipality(&value, "417020").await.unwrap();

        assert_eq!(from_text, from_value);
        assert_eq!(from_text[0].code, 31);
        assert_eq!(from_text[1].name, "Joaquina");
    }

    #[tokio::test]
    async fn test_points_decode_matches_pass_through() {
        let (text, value) = both_encodings(points_json());

        let from_text = fetch_points_by_location(&text, 31).await.unwrap();
        let from_value = fetch_points_by_location(&value, 31).await.unwrap();

        assert_eq!(from_text, from_value);
        let conditions: Vec<_> = from_text.iter().map(|p| p.condition.clone()).collect();
        assert_eq!(
            conditions,
            vec![Condition::Adequate, Condition::Inadequate, Condition::NotMeasured]
        );
    }

    #[tokio::test]
    async fn test_years_decode_matches_pass_through() {
        let (text, value) = both_encodings(years_json());

        let from_text = fetch_analyzed_years(&text).await.unwrap();
        let from_value = fetch_analyzed_years(&value).await.unwrap();

        assert_eq!(from_text, from_value);
    }

    #[tokio::test]
    async fn test_years_keep_upstream_order_and_duplicates() {
        let client = FakeTransport::ok(RawBody::Json(years_json()));
        let years = fetch_analyzed_years(&client).await.unwrap();
        assert_eq!(years, vec![2024, 2019, 2024, 2021]);
    }

    #[tokio::test]
    async fn test_locations_request_is_form_encoded() {
        let client = FakeTransport::ok(RawBody::Json(json!([])));
        let locations = fetch_locations_by_municipality(&client, "417020").await.unwrap();
        assert!(locations.is_empty());

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, LOCATIONS_BY_MUNICIPALITY_PATH);
        assert_eq!(
            calls[0].body,
            Some(RequestBody::Form(vec![(
                "municipioID".to_string(),
                "417020".to_string()
            )]))
        );
        let headers = calls[0].headers.as_ref().unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), FORM_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_points_request_is_form_encoded() {
        let client = FakeTransport::ok(RawBody::Text("[]".to_string()));
        fetch_points_by_location(&client, 31).await.unwrap();

        let calls = client.calls();
        assert_eq!(calls[0].path, POINTS_BY_LOCATION_PATH);
        assert_eq!(
            calls[0].body,
            Some(RequestBody::Form(vec![("localID".to_string(), "31".to_string())]))
        );
        let headers = calls[0].headers.as_ref().unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), FORM_CONTENT_TYPE);
    }

    fn assert_request_error(err: RepoError, status: Option<u16>, message: &str) {
        match err {
            RepoError::Request(e) => {
                assert_eq!(e.status, status);
                assert_eq!(e.message, message);
            }
            other => panic!("expected a request error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_error_propagates_for_every_operation() {
        let upstream = RequestError::from_response(503, Some(json!({"message": "manutenção"})));
        let client = FakeTransport::failing(upstream);

        assert_request_error(
            fetch_municipalities(&client).await.unwrap_err(),
            Some(503),
            "manutenção",
        );
        assert_request_error(
            fetch_locations_by_municipality(&client, "417020").await.unwrap_err(),
            Some(503),
            "manutenção",
        );
        assert_request_error(
            fetch_points_by_location(&client, 31).await.unwrap_err(),
            Some(503),
            "manutenção",
        );
        assert_request_error(
            fetch_analyzed_years(&client).await.unwrap_err(),
            Some(503),
            "manutenção",
        );
    }

    #[tokio::test]
    async fn test_network_error_propagates_for_every_operation() {
        let client = FakeTransport::failing(RequestError::transport());

        assert_request_error(
            fetch_municipalities(&client).await.unwrap_err(),
            None,
            DEFAULT_ERROR_MESSAGE,
        );
        assert_request_error(
            fetch_locations_by_municipality(&client, "417020").await.unwrap_err(),
            None,
            DEFAULT_ERROR_MESSAGE,
        );
        assert_request_error(
            fetch_points_by_location(&client, 31).await.unwrap_err(),
            None,
            DEFAULT_ERROR_MESSAGE,
        );
        assert_request_error(
            fetch_analyzed_years(&client).await.unwrap_err(),
            None,
            DEFAULT_ERROR_MESSAGE,
        );
    }

    #[tokio::test]
    async fn test_malformed_text_is_decode_error() {
        let client = FakeTransport::ok(RawBody::Text("<html>erro</html>".to_string()));
        let err = fetch_municipalities(&client).await.unwrap_err();

        assert!(matches!(err, RepoError::Decode(_)));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_repository_uses_shared_transport() {
        let fake = Arc::new(FakeTransport::ok(RawBody::Json(json!([]))));
        let repo = Repository::new(fake.clone());
        let other = repo.clone();

        repo.fetch_municipalities().await.unwrap();
        other.fetch_analyzed_years().await.unwrap();

        let paths: Vec<_> = fake.calls().into_iter().map(|c| c.path).collect();
        assert_eq!(paths, vec![MUNICIPALITIES_PATH, ANALYZED_YEARS_PATH]);
    }
}
