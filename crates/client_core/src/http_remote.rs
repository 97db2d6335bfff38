use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{Folder, FolderId, Service},
    error::{ApiError, ApiException},
    protocol::{CreateFolderRequest, CreatedFolder, SaveServicesRequest},
};
use url::Url;

use crate::remote::FolderRemote;

/// [`FolderRemote`] backed by a JSON folder service.
///
/// Routes, relative to the base url:
/// - `GET folders/{id}`
/// - `POST folders`
/// - `PUT folders/{id}/services`
pub struct HttpFolderRemote {
    http: Client,
    base_url: Url,
}

impl HttpFolderRemote {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid server url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("server url '{base_url}' cannot be used as a base"));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| anyhow!("server url '{}' cannot be used as a base", self.base_url))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}

/// Turns a non-2xx response into an error, preferring the server's
/// `ApiError` body when it sent one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => Err(anyhow::Error::new(ApiException::from(api_error))
            .context(format!("folder service responded {status}"))),
        Err(_) => Err(anyhow!("folder service responded {status}: {body}")),
    }
}

#[async_trait]
impl FolderRemote for HttpFolderRemote {
    async fn fetch_folder(&self, folder_id: &FolderId) -> Result<Folder> {
        let url = self.endpoint(&["folders", folder_id.as_str()])?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("failed to reach folder service")?;
        let folder = check_status(response)
            .await?
            .json::<Folder>()
            .await
            .context("malformed folder payload")?;
        Ok(folder)
    }

    async fn create_folder(&self, name: &str) -> Result<CreatedFolder> {
        let url = self.endpoint(&["folders"])?;
        let response = self
            .http
            .post(url)
            .json(&CreateFolderRequest {
                name: name.to_string(),
            })
            .send()
            .await
            .context("failed to reach folder service")?;
        let created = check_status(response)
            .await?
            .json::<CreatedFolder>()
            .await
            .context("malformed create-folder payload")?;
        Ok(created)
    }

    async fn save_services(&self, folder_id: &FolderId, services: &[Service]) -> Result<()> {
        let url = self.endpoint(&["folders", folder_id.as_str(), "services"])?;
        let response = self
            .http
            .put(url)
            .json(&SaveServicesRequest {
                services: services.to_vec(),
            })
            .send()
            .await
            .context("failed to reach folder service")?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_remote_tests.rs"]
mod tests;
