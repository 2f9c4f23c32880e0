use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{CommandTask, Item, ItemMetadata},
    protocol::{CommandPayload, SubmissionPayload},
};
use tracing::{debug, info};
use url::Url;

pub mod config;
pub mod error;
pub mod form;
pub mod gallery;
pub mod selection;
pub mod session;
pub mod transport;

pub use config::{load_settings, ClientSettings};
pub use error::{ClientError, Result};
pub use form::ParameterForm;
pub use gallery::Gallery;
pub use selection::{ActiveSelection, SelectionOutcome, SelectionTicket};
pub use session::OperatorSession;
pub use transport::Endpoints;

#[async_trait]
pub trait ClientHandle: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<Item>>;
    async fn fetch_metadata(&self, name: &str) -> Result<ItemMetadata>;
    async fn fetch_preview(&self, name: &str) -> Result<Vec<u8>>;
    async fn submit(&self, payload: &SubmissionPayload) -> Result<()>;
    async fn press_button(&self, task: CommandTask) -> Result<()>;

    async fn home(&self) -> Result<()> {
        self.press_button(CommandTask::Home).await
    }

    async fn start(&self) -> Result<()> {
        self.press_button(CommandTask::Start).await
    }

    async fn stop(&self) -> Result<()> {
        self.press_button(CommandTask::Stop).await
    }

    async fn clear_queue(&self) -> Result<()> {
        self.press_button(CommandTask::Clear).await
    }
}

/// Metadata fetch result, still tagged with the click that asked for it.
#[derive(Debug)]
pub struct MetadataResponse {
    pub ticket: SelectionTicket,
    pub result: Result<ItemMetadata>,
}

pub async fn resolve_selection<H>(handle: &H, ticket: SelectionTicket) -> MetadataResponse
where
    H: ClientHandle + ?Sized,
{
    let result = handle.fetch_metadata(&ticket.item().name).await;
    MetadataResponse { ticket, result }
}

pub struct SandTableClient {
    http: Client,
    endpoints: Endpoints,
}

impl SandTableClient {
    pub fn new(server_url: &str) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            endpoints: Endpoints::parse(server_url)?,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoints: Endpoints::parse(&settings.server_url)?,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T> {
        let response = self.http.get(url.clone()).send().await?;
        let bytes = ensure_success(&url, response)?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            resource: resource.to_string(),
            source,
        })
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: Url, body: &T) -> Result<()> {
        let response = self.http.post(url.clone()).json(body).send().await?;
        ensure_success(&url, response)?;
        Ok(())
    }
}

fn ensure_success(url: &Url, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::BadStatus {
            endpoint: url.path().to_string(),
            status,
        })
    }
}

#[async_trait]
impl ClientHandle for SandTableClient {
    async fn fetch_catalog(&self) -> Result<Vec<Item>> {
        let items: Vec<Item> = self.get_json(self.endpoints.catalog(), "catalog").await?;
        info!(count = items.len(), "loaded item catalog");
        Ok(items)
    }

    async fn fetch_metadata(&self, name: &str) -> Result<ItemMetadata> {
        if name.trim().is_empty() {
            return Err(ClientError::EmptyItemName);
        }
        let metadata: ItemMetadata = self
            .get_json(
                self.endpoints.metadata(name),
                &format!("metadata for '{name}'"),
            )
            .await?;
        debug!(
            item = name,
            engine = %metadata.engine,
            parameters = metadata.parameters.len(),
            "loaded item metadata"
        );
        Ok(metadata)
    }

    async fn fetch_preview(&self, name: &str) -> Result<Vec<u8>> {
        if name.trim().is_empty() {
            return Err(ClientError::EmptyItemName);
        }
        let url = self.endpoints.preview(name);
        let response = self.http.get(url.clone()).send().await?;
        let bytes = ensure_success(&url, response)?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<()> {
        self.post_json(self.endpoints.submit(), payload).await?;
        info!(
            item_id = %payload.item_id,
            engine = %payload.engine,
            parameters = payload.values().len(),
            "submission accepted"
        );
        Ok(())
    }

    async fn press_button(&self, task: CommandTask) -> Result<()> {
        self.post_json(self.endpoints.button(), &CommandPayload::from(task))
            .await?;
        info!(task = %task, "command accepted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
