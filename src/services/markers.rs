//! Progressive marker loading.
//!
//! Large inventories are revealed in fixed-size batches with a short pause
//! between them, so a renderer consuming the batches never has to place
//! thousands of markers in one go. Every load carries a generation number;
//! a newer load (or [`ProgressiveMarkerLoader::cancel`]) makes older loads
//! stop before their next commit.

use crate::config::MarkerLoaderConfig;
use crate::models::{Billboard, BillboardStatus, BoundingBox, GeoPoint};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// A billboard whose coordinates parsed, ready to be drawn.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlacedMarker {
    pub billboard_id: String,
    pub name: String,
    pub status: BillboardStatus,
    pub position: GeoPoint,
}

impl PlacedMarker {
    pub fn from_billboard(billboard: &Billboard) -> Option<Self> {
        Some(PlacedMarker {
            billboard_id: billboard.id.clone(),
            name: billboard.display_name().to_string(),
            status: billboard.status,
            position: billboard.position()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct LoadProgress {
    pub loaded_count: usize,
    pub total_count: usize,
    pub progress_percent: f64,
}

impl LoadProgress {
    fn new(loaded_count: usize, total_count: usize) -> Self {
        let progress_percent = if total_count == 0 {
            100.0
        } else {
            loaded_count as f64 * 100.0 / total_count as f64
        };
        LoadProgress {
            loaded_count,
            total_count,
            progress_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Every batch was committed
    Completed { batches: usize },
    /// A newer load took over after `batches` commits
    Superseded { batches: usize },
    /// Same inventory as the current load, nothing restarted
    Unchanged,
}

/// Parse coordinates once and drop billboards without a usable position.
/// With a `priority_center`, markers closest to it come first.
pub fn prepare_markers(inventory: &[Billboard], priority_center: Option<GeoPoint>) -> Vec<PlacedMarker> {
    let mut markers: Vec<PlacedMarker> = inventory
        .iter()
        .filter_map(PlacedMarker::from_billboard)
        .collect();

    let skipped = inventory.len() - markers.len();
    if skipped > 0 {
        tracing::debug!(skipped = skipped, "Skipped billboards without valid coordinates");
    }

    if let Some(center) = priority_center {
        markers.sort_by(|a, b| {
            center
                .distance_to(&a.position)
                .total_cmp(&center.distance_to(&b.position))
        });
    }

    markers
}

/// Every billboard with valid coordinates inside `bounds`.
pub fn viewport_query(inventory: &[Billboard], bounds: &BoundingBox) -> Vec<Billboard> {
    inventory
        .iter()
        .filter(|b| b.position().is_some_and(|p| bounds.contains(&p)))
        .cloned()
        .collect()
}

#[derive(Default)]
struct LoaderState {
    inventory: Option<Arc<Vec<Billboard>>>,
    loaded: Vec<PlacedMarker>,
    total: usize,
}

#[derive(Clone)]
pub struct ProgressiveMarkerLoader {
    batch_size: usize,
    batch_delay: Duration,
    priority_center: Option<GeoPoint>,
    generation: Arc<AtomicU64>,
    state: Arc<Mutex<LoaderState>>,
}

impl ProgressiveMarkerLoader {
    pub fn new(config: &MarkerLoaderConfig, prioritize: bool) -> Self {
        ProgressiveMarkerLoader {
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            priority_center: prioritize.then_some(config.priority_center),
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(LoaderState::default())),
        }
    }

    /// Reveal `inventory` batch by batch, calling `on_batch` after each
    /// commit with the newly revealed markers.
    ///
    /// Passing the same `Arc` as the current load is a no-op. Any other
    /// inventory resets the loaded set to empty and supersedes whatever load
    /// is in flight.
    ///
    /// `on_batch` runs while the loader state is locked and must not call
    /// back into the loader.
    pub async fn load<F>(&self, inventory: Arc<Vec<Billboard>>, mut on_batch: F) -> LoadOutcome
    where
        F: FnMut(&[PlacedMarker], LoadProgress) + Send,
    {
        let markers = prepare_markers(&inventory, self.priority_center);

        let generation = {
            let mut state = self.state.lock().await;
            if state
                .inventory
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &inventory))
            {
                return LoadOutcome::Unchanged;
            }

            state.inventory = Some(inventory);
            state.loaded.clear();
            state.total = markers.len();
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        tracing::debug!(
            generation = generation,
            total = markers.len(),
            batch_size = self.batch_size,
            "Starting progressive marker load"
        );

        let mut batches = 0;
        for (i, batch) in markers.chunks(self.batch_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }

            // Commit and callback under one lock so a newer load cannot
            // slip in between them
            let mut state = self.state.lock().await;
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!(
                    generation = generation,
                    committed = batches,
                    "Marker load superseded"
                );
                return LoadOutcome::Superseded { batches };
            }
            state.loaded.extend_from_slice(batch);
            let progress = LoadProgress::new(state.loaded.len(), state.total);
            batches += 1;
            on_batch(batch, progress);
        }

        tracing::debug!(generation = generation, batches = batches, "Marker load complete");
        LoadOutcome::Completed { batches }
    }

    /// Stop any load in flight and forget the loaded markers.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = LoaderState::default();
    }

    pub async fn loaded(&self) -> Vec<PlacedMarker> {
        self.state.lock().await.loaded.clone()
    }

    pub async fn progress(&self) -> LoadProgress {
        let state = self.state.lock().await;
        LoadProgress::new(state.loaded.len(), state.total)
    }
}

/// Debounced viewport lookup for pan/zoom.
///
/// Only the last of a burst of viewport changes within the debounce window
/// is evaluated.
#[derive(Clone)]
pub struct VisibleMarkers {
    debounce: Duration,
    generation: Arc<AtomicU64>,
    visible: Arc<RwLock<Vec<Billboard>>>,
}

impl VisibleMarkers {
    pub fn new(config: &MarkerLoaderConfig) -> Self {
        VisibleMarkers {
            debounce: Duration::from_millis(config.visible_debounce_ms),
            generation: Arc::new(AtomicU64::new(0)),
            visible: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Returns the number of visible billboards, or `None` when a later
    /// viewport change arrived during the debounce window.
    pub async fn viewport_changed(&self, inventory: Arc<Vec<Billboard>>, bounds: BoundingBox) -> Option<usize> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            return None;
        }

        let found = viewport_query(&inventory, &bounds);
        let count = found.len();
        *self.visible.write().await = found;
        Some(count)
    }

    pub async fn visible(&self) -> Vec<Billboard> {
        self.visible.read().await.clone()
    }
}
