//! Process-wide map SDK preload.
//!
//! The SDK is loaded at most once. Concurrent callers of
//! [`MapSdkCache::get_or_load`] wait on the same in-flight load; a failed
//! load leaves the cache uninitialized so a later call can retry.

use super::MapProvider;
use crate::error::Result;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkLoadState {
    Uninitialized,
    Loading,
    Ready,
}

impl SdkLoadState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SdkLoadState::Loading,
            2 => SdkLoadState::Ready,
            _ => SdkLoadState::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SdkLoadState::Uninitialized => 0,
            SdkLoadState::Loading => 1,
            SdkLoadState::Ready => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkHandle {
    pub provider: MapProvider,
    pub tile_url_template: String,
}

impl SdkHandle {
    pub fn for_provider(provider: MapProvider) -> Self {
        SdkHandle {
            provider,
            tile_url_template: provider.tile_url_template().to_string(),
        }
    }
}

pub struct MapSdkCache {
    handle: OnceCell<SdkHandle>,
    state: AtomicU8,
}

static MAP_SDK: MapSdkCache = MapSdkCache::new();

/// The process-wide SDK cache.
pub fn map_sdk() -> &'static MapSdkCache {
    &MAP_SDK
}

impl MapSdkCache {
    pub const fn new() -> Self {
        MapSdkCache {
            handle: OnceCell::const_new(),
            state: AtomicU8::new(0),
        }
    }

    pub fn state(&self) -> SdkLoadState {
        SdkLoadState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Loaded handle, without triggering a load
    pub fn get(&self) -> Option<&SdkHandle> {
        self.handle.get()
    }

    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<&SdkHandle>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SdkHandle>>,
    {
        self.handle
            .get_or_try_init(|| async move {
                self.set_state(SdkLoadState::Loading);
                tracing::debug!("Loading map SDK");

                match load().await {
                    Ok(handle) => {
                        tracing::info!(provider = %handle.provider, "Map SDK ready");
                        self.set_state(SdkLoadState::Ready);
                        Ok(handle)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Map SDK failed to load");
                        self.set_state(SdkLoadState::Uninitialized);
                        Err(e)
                    }
                }
            })
            .await
    }

    fn set_state(&self, state: SdkLoadState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

impl Default for MapSdkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_load() {
        let cache = Arc::new(MapSdkCache::new());
        let loads = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let cache = cache.clone();
                let loads = loads.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_load(|| async {
                            loads.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(200)).await;
                            Ok(SdkHandle::for_provider(MapProvider::Google))
                        })
                        .await
                        .map(|h| h.provider)
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), MapProvider::Google);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state(), SdkLoadState::Ready);
    }

    #[tokio::test]
    async fn test_failed_load_can_be_retried() {
        let cache = MapSdkCache::new();
        assert_eq!(cache.state(), SdkLoadState::Uninitialized);

        let failed = cache
            .get_or_load(|| async { Err(AppError::Internal("script blocked".to_string())) })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.state(), SdkLoadState::Uninitialized);
        assert!(cache.get().is_none());

        let handle = cache
            .get_or_load(|| async { Ok(SdkHandle::for_provider(MapProvider::OpenStreetMap)) })
            .await
            .unwrap();
        assert_eq!(handle.provider, MapProvider::OpenStreetMap);
    }
}
