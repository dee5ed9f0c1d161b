use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::geo::GeoPoint;

pub const DEFAULT_DISTANCE_MATRIX_URL: &str =
    "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Per-route status reported by the routing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStatus {
    Ok,
    ZeroResults,
    Other(String),
}

impl RouteStatus {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "OK" => RouteStatus::Ok,
            "ZERO_RESULTS" => RouteStatus::ZeroResults,
            other => RouteStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RouteStatus::Ok => "OK",
            RouteStatus::ZeroResults => "ZERO_RESULTS",
            RouteStatus::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub distance_meters: i64,
    pub status: RouteStatus,
}

#[async_trait]
pub trait DistanceResolver: Send + Sync {
    /// Performs exactly one lookup. Transient failures are returned, not retried.
    async fn resolve(&self, origin: GeoPoint, destination: GeoPoint)
        -> Result<ResolvedRoute, AppError>;
}

/// Distance Matrix API client.
///
/// The API key is passed in by the caller; do not log it.
#[derive(Clone)]
pub struct DistanceMatrixClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl DistanceMatrixClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

#[async_trait]
impl DistanceResolver for DistanceMatrixClient {
    async fn resolve(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<ResolvedRoute, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MisconfiguredCredential)?;

        let origins = format!("{},{}", origin.lat, origin.lng);
        let destinations = format!("{},{}", destination.lat, destination.lng);

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|err| {
                let cause = if err.is_timeout() {
                    "request timed out".to_string()
                } else {
                    // without_url keeps the key out of the message
                    format!("request failed: {}", err.without_url())
                };
                AppError::ServiceUnreachable(cause)
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::ServiceUnreachable(format!(
                "http status {}",
                status.as_u16()
            )));
        }

        let body: MatrixResponse = resp.json().await.map_err(|err| {
            AppError::ServiceUnreachable(format!("response decode failed: {}", err.without_url()))
        })?;

        body.into_route()
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: i64,
}

impl MatrixResponse {
    fn into_route(self) -> Result<ResolvedRoute, AppError> {
        if self.status != "OK" {
            let detail = self.error_message.unwrap_or_default();
            return Err(AppError::ServiceUnreachable(format!(
                "service status {} {detail}",
                self.status
            )));
        }

        let element = self
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| AppError::ServiceUnreachable("response has no elements".to_string()))?;

        let status = RouteStatus::from_tag(&element.status);
        let distance_meters = match (&status, element.distance) {
            (RouteStatus::Ok, Some(distance)) => distance.value,
            (RouteStatus::Ok, None) => {
                return Err(AppError::ServiceUnreachable(
                    "route is OK but has no distance".to_string(),
                ));
            }
            (_, distance) => distance.map(|d| d.value).unwrap_or(0),
        };

        Ok(ResolvedRoute {
            distance_meters,
            status,
        })
    }
}
