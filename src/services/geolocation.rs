use crate::error::{AppError, GeolocationError, Result};
use crate::models::LocationFix;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::path::Path;
use std::time::Duration;

pub type FixStream = BoxStream<'static, std::result::Result<LocationFix, GeolocationError>>;

/// Continuous device location subscription.
///
/// Starting the watch may fail (e.g. permission denied). Errors inside the
/// stream are transient: the subscription keeps going.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn watch(&self) -> std::result::Result<FixStream, GeolocationError>;

    fn provider_name(&self) -> &'static str;
}

/// Plays back a prerecorded list of fixes, one per `interval`.
#[derive(Debug, Clone)]
pub struct ReplayGeolocation {
    events: Vec<std::result::Result<LocationFix, GeolocationError>>,
    interval: Duration,
    start_error: Option<GeolocationError>,
}

impl ReplayGeolocation {
    pub fn new(fixes: Vec<LocationFix>) -> Self {
        Self::with_events(fixes.into_iter().map(Ok).collect())
    }

    /// Replay that may include transient errors between fixes.
    pub fn with_events(events: Vec<std::result::Result<LocationFix, GeolocationError>>) -> Self {
        ReplayGeolocation {
            events,
            interval: Duration::from_millis(1000),
            start_error: None,
        }
    }

    /// A provider whose watch never starts.
    pub fn failing(error: GeolocationError) -> Self {
        ReplayGeolocation {
            events: Vec::new(),
            interval: Duration::from_millis(1000),
            start_error: Some(error),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Load a JSON array of fixes, e.g. a recorded drive.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::InvalidRequest(format!("Cannot read track {}: {}", path.display(), e))
        })?;
        let fixes: Vec<LocationFix> = serde_json::from_str(&raw)?;

        tracing::info!(
            path = %path.display(),
            fixes = fixes.len(),
            "Loaded GPS replay track"
        );
        Ok(Self::new(fixes))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl GeolocationProvider for ReplayGeolocation {
    async fn watch(&self) -> std::result::Result<FixStream, GeolocationError> {
        if let Some(error) = self.start_error {
            tracing::warn!(error = %error, "Location watch failed to start");
            return Err(error);
        }

        let interval = self.interval;
        let events = self.events.clone();
        Ok(stream::iter(events)
            .then(move |event| async move {
                tokio::time::sleep(interval).await;
                event
            })
            .boxed())
    }

    fn provider_name(&self) -> &'static str {
        "replay"
    }
}
