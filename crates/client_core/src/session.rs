use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::{Folder, FolderId, NewServiceDraft, Service, ServiceId};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::SessionError,
    ids::{allocate_unique, IdGenerator, UuidIdGenerator},
    remote::{FolderRemote, SimulatedFolderRemote},
    status::{self, SessionStatus},
};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

/// How async operations treat the busy flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BusyPolicy {
    /// The flag is informational. Overlapping operations all run and the one
    /// that completes last decides the observable state.
    #[default]
    Advisory,
    /// An async operation started while another is in flight is rejected.
    SingleFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoFolder,
    FolderActive,
}

/// Point-in-time copy of everything a presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Active folder; its `services` always equal [`Self::services`].
    pub folder: Option<Folder>,
    pub services: Vec<Service>,
    pub folder_name_draft: String,
    pub service_draft: NewServiceDraft,
    pub busy: bool,
    pub message: String,
}

impl SessionSnapshot {
    pub fn phase(&self) -> SessionPhase {
        if self.folder.is_some() {
            SessionPhase::FolderActive
        } else {
            SessionPhase::NoFolder
        }
    }
}

#[derive(Debug, Clone)]
struct FolderHeader {
    id: FolderId,
    name: String,
}

// The service list lives here once; the folder view is assembled from it.
#[derive(Debug, Default)]
struct SessionState {
    folder: Option<FolderHeader>,
    services: Vec<Service>,
    folder_name_draft: String,
    service_draft: NewServiceDraft,
    status: SessionStatus,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            folder: self.folder.as_ref().map(|header| Folder {
                id: header.id.clone(),
                name: header.name.clone(),
                services: self.services.clone(),
            }),
            services: self.services.clone(),
            folder_name_draft: self.folder_name_draft.clone(),
            service_draft: self.service_draft.clone(),
            busy: self.status.busy,
            message: self.status.message.clone(),
        }
    }
}

/// Owns one folder-editing session and every transition on it.
///
/// Async operations never hold the session lock across their remote call, so
/// the state stays observable (and editable) while they are in flight.
pub struct FolderSessionController {
    remote: Arc<dyn FolderRemote>,
    ids: Arc<dyn IdGenerator>,
    busy_policy: BusyPolicy,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionSnapshot>,
}

impl FolderSessionController {
    pub fn new(remote: Arc<dyn FolderRemote>) -> Arc<Self> {
        Self::new_with_dependencies(remote, Arc::new(UuidIdGenerator), BusyPolicy::default())
    }

    /// Controller over [`SimulatedFolderRemote`] with its default latency.
    pub fn simulated() -> Arc<Self> {
        Self::new(Arc::new(SimulatedFolderRemote::default()))
    }

    pub fn new_with_dependencies(
        remote: Arc<dyn FolderRemote>,
        ids: Arc<dyn IdGenerator>,
        busy_policy: BusyPolicy,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Arc::new(Self {
            remote,
            ids,
            busy_policy,
            inner: Mutex::new(SessionState::default()),
            events,
        })
    }

    pub fn busy_policy(&self) -> BusyPolicy {
        self.busy_policy
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    /// A snapshot is sent after every state change, including the start of an
    /// async operation.
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<SessionSnapshot> {
        self.events.subscribe()
    }

    pub fn set_folder_name_draft(&self, name: impl Into<String>) {
        let mut state = self.state();
        state.folder_name_draft = name.into();
        self.publish(&state);
    }

    pub fn set_service_title_draft(&self, title: impl Into<String>) {
        let mut state = self.state();
        state.service_draft.title = title.into();
        self.publish(&state);
    }

    pub fn set_service_description_draft(&self, description: impl Into<String>) {
        let mut state = self.state();
        state.service_draft.description = description.into();
        self.publish(&state);
    }

    /// Replaces the session folder and its services with the remote copy.
    /// On failure the previous folder is kept.
    pub async fn fetch_folder(
        &self,
        folder_id: impl Into<FolderId>,
    ) -> Result<Folder, SessionError> {
        let folder_id = folder_id.into();
        self.begin_remote("fetch")?;

        let result = self.remote.fetch_folder(&folder_id).await;

        let mut state = self.state();
        state.status.busy = false;
        let outcome = match result {
            Ok(folder) => {
                info!(
                    folder_id = %folder.id,
                    services = folder.services.len(),
                    "folder fetched"
                );
                state.folder = Some(FolderHeader {
                    id: folder.id.clone(),
                    name: folder.name.clone(),
                });
                state.services = folder.services.clone();
                state.status.set_message(status::FETCH_SUCCEEDED);
                Ok(folder)
            }
            Err(source) => {
                warn!(folder_id = %folder_id, error = %format!("{source:#}"), "folder fetch failed");
                state.status.set_message(status::FETCH_FAILED);
                Err(SessionError::Remote {
                    operation: "fetch",
                    source,
                })
            }
        };
        self.publish(&state);
        outcome
    }

    /// Creates a new, empty folder named `name`. A blank name is rejected
    /// before anything is sent.
    pub async fn create_folder(&self, name: &str) -> Result<Folder, SessionError> {
        if name.trim().is_empty() {
            return Err(self.reject(status::FOLDER_NAME_REQUIRED));
        }
        self.begin_remote("create")?;

        let result = self.remote.create_folder(name).await;

        let mut state = self.state();
        state.status.busy = false;
        let outcome = match result {
            Ok(created) => {
                info!(folder_id = %created.id, "folder created");
                let message = status::folder_created(&created.name, created.id.as_str());
                state.folder = Some(FolderHeader {
                    id: created.id.clone(),
                    name: created.name.clone(),
                });
                state.services.clear();
                state.folder_name_draft.clear();
                state.status.set_message(message);
                Ok(Folder {
                    id: created.id,
                    name: created.name,
                    services: Vec::new(),
                })
            }
            Err(source) => {
                warn!(error = %format!("{source:#}"), "folder creation failed");
                state.status.set_message(status::CREATE_FAILED);
                Err(SessionError::Remote {
                    operation: "create",
                    source,
                })
            }
        };
        self.publish(&state);
        outcome
    }

    pub async fn create_folder_from_draft(&self) -> Result<Folder, SessionError> {
        let name = self.state().folder_name_draft.clone();
        self.create_folder(&name).await
    }

    /// Appends a service built from `draft` to the end of the collection.
    ///
    /// An active folder is not required; services added without one are
    /// dropped by the next create or fetch.
    pub fn add_service(&self, draft: NewServiceDraft) -> Result<Service, SessionError> {
        if !draft.is_complete() {
            return Err(self.reject(status::SERVICE_FIELDS_REQUIRED));
        }

        let mut state = self.state();
        let id = allocate_unique(self.ids.as_ref(), |candidate| {
            state
                .services
                .iter()
                .any(|service| service.id.as_str() == candidate)
        });
        let service = Service {
            id: ServiceId::new(id),
            title: draft.title,
            description: draft.description,
        };
        info!(
            service_id = %service.id,
            folder_active = state.folder.is_some(),
            "service added"
        );
        state.services.push(service.clone());
        state.service_draft.clear();
        state.status.set_message(status::SERVICE_ADDED);
        self.publish(&state);
        Ok(service)
    }

    pub fn add_service_from_draft(&self) -> Result<Service, SessionError> {
        let draft = self.state().service_draft.clone();
        self.add_service(draft)
    }

    /// Removes the service with `service_id`, returning whether one was found.
    /// A missing id changes nothing but still reports the deletion.
    pub fn delete_service(&self, service_id: &str) -> bool {
        let mut state = self.state();
        let position = state
            .services
            .iter()
            .position(|service| service.id.as_str() == service_id);
        let removed = match position {
            Some(index) => {
                state.services.remove(index);
                info!(service_id, "service deleted");
                true
            }
            None => {
                debug!(service_id, "delete requested for unknown service");
                false
            }
        };
        state.status.set_message(status::SERVICE_DELETED);
        self.publish(&state);
        removed
    }

    /// Sends the current services of the active folder to the remote.
    ///
    /// Returns `Ok(false)` without touching any state when no folder is
    /// active.
    pub async fn save_services(&self) -> Result<bool, SessionError> {
        let (folder_id, services) = {
            let state = self.state();
            match &state.folder {
                Some(header) => (header.id.clone(), state.services.clone()),
                None => {
                    debug!("save requested without an active folder");
                    return Ok(false);
                }
            }
        };
        self.begin_remote("save")?;

        let result = self.remote.save_services(&folder_id, &services).await;

        let mut state = self.state();
        state.status.busy = false;
        let outcome = match result {
            Ok(()) => {
                info!(folder_id = %folder_id, services = services.len(), "services saved");
                state.status.set_message(status::SAVE_SUCCEEDED);
                Ok(true)
            }
            Err(source) => {
                warn!(folder_id = %folder_id, error = %format!("{source:#}"), "saving services failed");
                state.status.set_message(status::SAVE_FAILED);
                Err(SessionError::Remote {
                    operation: "save",
                    source,
                })
            }
        };
        self.publish(&state);
        outcome
    }

    /// Drops the folder and its services and clears the status message.
    /// Drafts survive a reset.
    pub fn reset_session(&self) {
        let mut state = self.state();
        if let Some(header) = state.folder.take() {
            info!(folder_id = %header.id, "session reset");
        }
        state.services.clear();
        state.status.message.clear();
        self.publish(&state);
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SessionState) {
        let _ = self.events.send(state.snapshot());
    }

    fn reject(&self, message: &'static str) -> SessionError {
        warn!(reason = message, "input rejected");
        let mut state = self.state();
        state.status.set_message(message);
        self.publish(&state);
        SessionError::Validation(message)
    }

    fn begin_remote(&self, operation: &'static str) -> Result<(), SessionError> {
        let mut state = self.state();
        if state.status.busy && self.busy_policy == BusyPolicy::SingleFlight {
            warn!(operation, "rejected while another operation is in flight");
            state.status.set_message(status::OPERATION_IN_PROGRESS);
            self.publish(&state);
            return Err(SessionError::Busy);
        }
        debug!(operation, "remote operation started");
        state.status.busy = true;
        self.publish(&state);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
