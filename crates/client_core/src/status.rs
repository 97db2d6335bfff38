//! User-facing status texts written into the session's status message.

pub const FETCH_SUCCEEDED: &str = "Folder successfully fetched!";
pub const FETCH_FAILED: &str = "Error while fetching folder";
pub const FOLDER_NAME_REQUIRED: &str = "Please enter a folder name";
pub const CREATE_FAILED: &str = "Error while creating folder";
pub const SERVICE_FIELDS_REQUIRED: &str = "Please fill in all service fields";
pub const SERVICE_ADDED: &str = "Service successfully added!";
pub const SERVICE_DELETED: &str = "Service deleted";
pub const SAVE_SUCCEEDED: &str = "Services successfully saved!";
pub const SAVE_FAILED: &str = "Error while saving services";
pub const OPERATION_IN_PROGRESS: &str = "Another operation is still in progress";

pub fn folder_created(name: &str, id: &str) -> String {
    format!("Folder \"{name}\" created successfully! ID: {id}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub busy: bool,
    pub message: String,
}

impl SessionStatus {
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }
}
