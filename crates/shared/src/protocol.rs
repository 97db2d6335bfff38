use serde::{Deserialize, Serialize};

use crate::domain::{FolderId, Service};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
}

/// Remote acknowledgement of a created folder. The id is assigned remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFolder {
    pub id: FolderId,
    pub name: String,
}

/// Full replacement of a folder's service list. Repeating it is harmless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveServicesRequest {
    pub services: Vec<Service>,
}
