//! The remote collaborator that folders are fetched from, created on and
//! saved to.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Folder, FolderId, Service, ServiceId},
    protocol::CreatedFolder,
};

use crate::ids::{IdGenerator, UuidIdGenerator};

pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(1000);

#[async_trait]
pub trait FolderRemote: Send + Sync {
    /// Returns the folder with its full, ordered service list.
    async fn fetch_folder(&self, folder_id: &FolderId) -> Result<Folder>;
    /// Registers a new, empty folder; the remote assigns its id.
    async fn create_folder(&self, name: &str) -> Result<CreatedFolder>;
    /// Replaces the folder's stored services with `services`.
    async fn save_services(&self, folder_id: &FolderId, services: &[Service]) -> Result<()>;
}

/// In-process stand-in for a folder backend: waits a fixed latency and
/// answers with canned data.
pub struct SimulatedFolderRemote {
    latency: Duration,
    ids: Arc<dyn IdGenerator>,
    fail_with: Option<String>,
}

impl SimulatedFolderRemote {
    pub fn new(latency: Duration) -> Self {
        Self::with_id_generator(latency, Arc::new(UuidIdGenerator))
    }

    pub fn with_id_generator(latency: Duration, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            latency,
            ids,
            fail_with: None,
        }
    }

    /// Every call waits out the latency and then fails with `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.fail_with = Some(reason.into());
        self
    }

    async fn round_trip(&self) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.fail_with {
            Some(reason) => Err(anyhow!(reason.clone())),
            None => Ok(()),
        }
    }
}

impl Default for SimulatedFolderRemote {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_LATENCY)
    }
}

#[async_trait]
impl FolderRemote for SimulatedFolderRemote {
    async fn fetch_folder(&self, folder_id: &FolderId) -> Result<Folder> {
        self.round_trip().await?;
        Ok(Folder {
            id: folder_id.clone(),
            name: format!("Folder {folder_id}"),
            services: vec![
                Service {
                    id: ServiceId::from("1"),
                    title: "Web Service".into(),
                    description: "Modern website development".into(),
                },
                Service {
                    id: ServiceId::from("2"),
                    title: "Mobile Service".into(),
                    description: "iOS and Android mobile apps".into(),
                },
            ],
        })
    }

    async fn create_folder(&self, name: &str) -> Result<CreatedFolder> {
        self.round_trip().await?;
        Ok(CreatedFolder {
            id: FolderId::new(self.ids.next_id()),
            name: name.to_string(),
        })
    }

    async fn save_services(&self, _folder_id: &FolderId, _services: &[Service]) -> Result<()> {
        self.round_trip().await
    }
}
