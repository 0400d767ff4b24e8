use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;
use ureq::http::Response;

use crate::config::ClientSettings;
use crate::library::{TrackBlob, TrackId, TrackMetadata};

use super::server::RatingRequest;
use super::{DeliveryError, DeliveryService, ErrorBody};

/// Blocking client for the HTTP delivery service.
///
/// Every call is bounded by the configured request timeout so a stalled
/// server surfaces as `DeliveryError::Timeout`.
pub struct RemoteLibrary {
    base_url: String,
    agent: Agent,
    max_track_bytes: u64,
}

impl RemoteLibrary {
    pub fn new(settings: &ClientSettings) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(settings.request_timeout_ms)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            base_url: settings.server_url.trim_end_matches('/').to_string(),
            agent,
            max_track_bytes: settings.max_track_bytes,
        }
    }

    fn track_url(&self, id: &TrackId, suffix: &str) -> String {
        format!(
            "{}/tracks/{}{}",
            self.base_url,
            urlencoding::encode(id.as_str()),
            suffix
        )
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: Option<(&str, &str)>,
        id: Option<&TrackId>,
    ) -> Result<T, DeliveryError> {
        let mut request = self.agent.get(url);
        if let Some((key, value)) = query {
            request = request.query(key, value);
        }
        let response = request.call().map_err(transport_error)?;
        let mut response = check_status(response, id)?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;
        serde_json::from_str(&body).map_err(|e| DeliveryError::Protocol(e.to_string()))
    }
}

fn transport_error(err: ureq::Error) -> DeliveryError {
    match err {
        ureq::Error::Timeout(_) => DeliveryError::Timeout,
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => DeliveryError::Timeout,
        ureq::Error::BodyExceedsLimit(limit) => {
            DeliveryError::Protocol(format!("response larger than {limit} bytes"))
        }
        other => DeliveryError::RemoteUnavailable(other.to_string()),
    }
}

/// Turn non-success responses into the error the server reported.
fn check_status(
    mut response: Response<ureq::Body>,
    id: Option<&TrackId>,
) -> Result<Response<ureq::Body>, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .body_mut()
        .read_to_string()
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
        .map(|body| body.message)
        .unwrap_or_else(|| status.to_string());

    Err(match (status.as_u16(), id) {
        (404, Some(id)) => DeliveryError::NotFound(id.clone()),
        (500, _) => DeliveryError::IoFailure(message),
        _ => DeliveryError::Protocol(format!("{status}: {message}")),
    })
}

impl DeliveryService for RemoteLibrary {
    fn list_tracks(&self) -> Result<Vec<TrackId>, DeliveryError> {
        self.get_json(&format!("{}/tracks", self.base_url), None, None)
    }

    fn fetch_track(&self, id: &TrackId) -> Result<TrackBlob, DeliveryError> {
        let response = self
            .agent
            .get(&self.track_url(id, ""))
            .call()
            .map_err(transport_error)?;
        let mut response = check_status(response, Some(id))?;
        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_track_bytes)
            .read_to_vec()
            .map_err(transport_error)?;
        Ok(TrackBlob::from(bytes))
    }

    fn fetch_metadata(&self, id: &TrackId) -> Result<TrackMetadata, DeliveryError> {
        self.get_json(&self.track_url(id, "/metadata"), None, Some(id))
    }

    fn search(&self, query: &str) -> Result<Vec<TrackId>, DeliveryError> {
        self.get_json(
            &format!("{}/search", self.base_url),
            Some(("q", query)),
            None,
        )
    }

    fn rate(&self, id: &TrackId, score: i32) -> Result<(), DeliveryError> {
        let body = serde_json::to_string(&RatingRequest { score })
            .map_err(|e| DeliveryError::Protocol(e.to_string()))?;
        let response = self
            .agent
            .post(&self.track_url(id, "/rating"))
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(transport_error)?;
        check_status(response, Some(id))?;
        Ok(())
    }
}
