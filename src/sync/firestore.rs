use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tokio::sync::RwLock;
use url::Url;

use super::types::*;
use super::DocumentStore;
use crate::error::FetchError;

const PAGE_SIZE: &str = "300";

/// Document store backed by the Firestore REST API.
pub struct FirestoreClient {
    client: Client,
    /// `{base}/projects/{project}/databases/(default)/documents`
    documents_url: Url,
    api_key: Option<String>,
    id_token: RwLock<Option<String>>,
}

impl FirestoreClient {
    pub fn new(base_url: &Url, project_id: &str) -> Result<Self, FetchError> {
        let mut documents_url = base_url.clone();
        documents_url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["projects", project_id, "databases", "(default)", "documents"]);

        Ok(Self {
            client: Client::new(),
            documents_url,
            api_key: None,
            id_token: RwLock::new(None),
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn documents_url(&self) -> &str {
        self.documents_url.as_str()
    }

    /// Bearer token sent with every request; `None` for anonymous access.
    pub async fn set_id_token(&self, token: Option<String>) {
        *self.id_token.write().await = token;
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .extend(segments);
        Ok(url)
    }

    async fn authorize(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(key) = &self.api_key {
            req = req.query(&[("key", key)]);
        }
        if let Some(token) = self.id_token.read().await.as_deref() {
            req = req.bearer_auth(token);
        }
        req
    }
}

async fn check(resp: Response) -> Result<Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        message: extract_error(&body),
    })
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, FetchError> {
        let url = self.url_for(&[collection])?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.client.get(url.clone()).query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }
            let resp = check(self.authorize(req).await.send().await?).await?;
            let page: ListDocumentsResponse = serde_json::from_str(&resp.text().await?)?;

            documents.extend(page.documents.into_iter().map(Document::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("Fetched {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    async fn upsert(&self, collection: &str, document: &Document) -> Result<(), FetchError> {
        let url = self.url_for(&[collection, document.id.as_str()])?;

        let mut field_names: Vec<&String> = document.fields.keys().collect();
        field_names.sort();
        let mask: Vec<(&str, &str)> = field_names
            .iter()
            .map(|name| ("updateMask.fieldPaths", name.as_str()))
            .collect();

        let req = self
            .client
            .patch(url)
            .query(&mask)
            .json(&FirestoreDocument::from(document));
        check(self.authorize(req).await.send().await?).await?;

        log::debug!("Upserted {}/{}", collection, document.id);
        Ok(())
    }
}

fn extract_error(body: &str) -> String {
    let value = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(v) => v,
        Err(_) => return body.to_string(),
    };
    let error = value.get("error");
    error
        .and_then(|e| e.get("message"))
        .or(error)
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| body.to_string())
}
