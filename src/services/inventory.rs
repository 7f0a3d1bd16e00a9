//! Billboard inventory sources.
//!
//! Loading never takes the map down: a failing or slow source is reported
//! and treated as an empty inventory.

use crate::error::{AppError, Result};
use crate::models::Billboard;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn load(&self) -> Result<Vec<Billboard>>;

    fn source_name(&self) -> &'static str;
}

/// Inventory exported as a JSON array of billboards.
#[derive(Debug, Clone)]
pub struct JsonFileInventory {
    path: PathBuf,
}

impl JsonFileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileInventory { path: path.into() }
    }
}

#[async_trait]
impl InventorySource for JsonFileInventory {
    async fn load(&self) -> Result<Vec<Billboard>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Inventory(format!("Cannot read {}: {}", self.path.display(), e))
        })?;
        let billboards: Vec<Billboard> = serde_json::from_str(&raw)?;
        Ok(billboards)
    }

    fn source_name(&self) -> &'static str {
        "json_file"
    }
}

/// Fixed in-memory inventory.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory(pub Vec<Billboard>);

#[async_trait]
impl InventorySource for StaticInventory {
    async fn load(&self) -> Result<Vec<Billboard>> {
        Ok(self.0.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Load with a deadline; any failure or timeout yields an empty inventory.
pub async fn load_inventory_or_empty(source: &dyn InventorySource, timeout: Duration) -> Vec<Billboard> {
    match tokio::time::timeout(timeout, source.load()).await {
        Ok(Ok(billboards)) => {
            let placeable = billboards.iter().filter(|b| b.position().is_some()).count();
            tracing::info!(
                source = source.source_name(),
                total = billboards.len(),
                placeable = placeable,
                "Inventory loaded"
            );
            billboards
        }
        Ok(Err(e)) => {
            tracing::error!(source = source.source_name(), error = %e, "Inventory load failed");
            Vec::new()
        }
        Err(_) => {
            tracing::error!(
                source = source.source_name(),
                timeout_secs = timeout.as_secs(),
                "Inventory load timed out"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowInventory;

    #[async_trait]
    impl InventorySource for SlowInventory {
        async fn load(&self) -> Result<Vec<Billboard>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![Billboard::new("late", "Late", "32,13")])
        }

        fn source_name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty_inventory() {
        let source = JsonFileInventory::new("/nonexistent/billboards.json");
        assert!(source.load().await.is_err());
        assert!(load_inventory_or_empty(&source, Duration::from_secs(1)).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_empty_inventory() {
        let billboards = load_inventory_or_empty(&SlowInventory, Duration::from_secs(15)).await;
        assert!(billboards.is_empty());
    }

    #[tokio::test]
    async fn test_reads_json_inventory() {
        let path = std::env::temp_dir().join(format!("inventory-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(
            &path,
            r#"[{"id":"1","name":"Airport Road","coordinates":"32.88,13.19","status":"soon"},
                {"id":"2","name":"Broken","coordinates":""}]"#,
        )
        .await
        .unwrap();

        let billboards = load_inventory_or_empty(&JsonFileInventory::new(&path), Duration::from_secs(1)).await;
        tokio::fs::remove_file(&path).await.ok();

        assert_eq!(billboards.len(), 2);
        assert_eq!(billboards[0].status, crate::models::BillboardStatus::Soon);
        assert!(billboards[1].position().is_none());
    }
}
