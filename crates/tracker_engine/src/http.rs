use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracker_core::JobSnapshot;
use tracker_logging::{tracker_debug, tracker_info, tracker_trace, tracker_warn};
use url::Url;

use crate::decode::{decode_notification, decode_snapshot};
use crate::sse::SseDecoder;
use crate::{SnapshotStore, StoreError, Subscription};

#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Root of the job API; rows live under `{base_url}/jobs/{id}`.
    pub base_url: String,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    /// Applies to point reads only; change streams stay open indefinitely.
    pub request_timeout: Duration,
    /// Rows buffered between the stream reader and the tracker.
    pub channel_capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            channel_capacity: 32,
        }
    }
}

/// Job store reached over HTTP: JSON point reads and a Server-Sent Events
/// change stream per job.
#[derive(Debug, Clone)]
pub struct HttpSnapshotStore {
    settings: StoreSettings,
    base: Url,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl HttpSnapshotStore {
    pub fn new(settings: StoreSettings) -> Result<Self, StoreError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| StoreError::InvalidUrl(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(settings.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| StoreError::Network(err.to_string()))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| StoreError::Network(err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
            stream_client,
        })
    }

    fn job_url(&self, job_id: &str, events: bool) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidUrl(self.settings.base_url.clone()))?;
            segments.pop_if_empty().push("jobs").push(job_id);
            if events {
                segments.push("events");
            }
        }
        Ok(url)
    }

    fn request(&self, client: &reqwest::Client, url: Url) -> reqwest::RequestBuilder {
        let request = client.get(url);
        match &self.settings.api_key {
            Some(key) => request.header(AUTHORIZATION, format!("Bearer {key}")),
            None => request,
        }
    }
}

#[async_trait]
impl SnapshotStore for HttpSnapshotStore {
    async fn fetch(&self, job_id: &str) -> Result<JobSnapshot, StoreError> {
        let url = self.job_url(job_id, false)?;
        tracker_debug!("Fetching job {} from {}", job_id, url);

        let response = self
            .request(&self.client, url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response)?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(decode_snapshot(&body)?)
    }

    async fn subscribe(&self, job_id: &str) -> Result<Subscription, StoreError> {
        let url = self.job_url(job_id, true)?;
        tracker_debug!("Opening change stream for job {} at {}", job_id, url);

        let response = self
            .request(&self.stream_client, url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response)?;

        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        tokio::spawn(pump_events(job_id.to_string(), response, tx, cancel.clone()));

        Ok(Subscription::new(job_id, rx, cancel))
    }
}

async fn pump_events(
    job_id: String,
    response: Response,
    tx: mpsc::Sender<JobSnapshot>,
    cancel: CancellationToken,
) {
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => {
                tracker_debug!("Change stream for job {} cancelled", job_id);
                return;
            }
            chunk = stream.next() => chunk,
        };
        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(err)) => {
                tracker_warn!("Change stream for job {} failed: {}", job_id, err);
                return;
            }
            None => {
                tracker_info!("Change stream for job {} closed by server", job_id);
                return;
            }
        };

        for event in decoder.push(&bytes) {
            if !event.carries_row() {
                tracker_trace!("Ignoring {:?} event for job {}", event.event, job_id);
                continue;
            }
            match decode_notification(event.data.as_bytes()) {
                Ok(snapshot) => {
                    if tx.send(snapshot).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    tracker_warn!("Dropping notification for job {}: {}", job_id, err);
                }
            }
        }
    }
}

fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound);
    }
    if !status.is_success() {
        return Err(StoreError::HttpStatus(status.as_u16()));
    }
    Ok(response)
}

fn map_reqwest_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        return StoreError::Timeout;
    }
    StoreError::Network(err.to_string())
}
