//! HTTP client for the registry API
//!
//! Submissions go out as multipart forms (one part per changed field, file
//! or deletion marker) or as a JSON body for collections that carry no
//! files.

use super::{ApiError, RegistryApi};
use crate::config::{ConsoleConfig, Session};
use crate::state::{EntityKind, Record, Submission, SubmitTarget, WireEncoding, WirePart};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;

/// Client for the registry REST API
pub struct RegistryClient {
    http: Client,
    config: ConsoleConfig,
    session: Session,
}

impl RegistryClient {
    pub fn new(config: ConsoleConfig, session: Session) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    fn url(&self, kind: EntityKind, id: Option<&str>) -> String {
        let base = format!("{}{}", self.config.api_url(), self.config.route(kind));
        match id {
            Some(id) => format!("{base}/{id}"),
            None => base,
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        match &self.session.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-2xx answer into [`ApiError::Status`]
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    async fn multipart(parts: Vec<WirePart>) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for part in parts {
            form = match part {
                WirePart::Text { name, value } => form.text(name, value),
                WirePart::File { name, file } => {
                    let bytes = tokio::fs::read(&file.path)
                        .await
                        .map_err(|source| ApiError::File {
                            path: file.path.clone(),
                            source,
                        })?;
                    form.part(name, Part::bytes(bytes).file_name(file.name))
                }
            };
        }
        Ok(form)
    }
}

/// Collections answer with a bare array; a `data` wrapper is tolerated
fn records_from_body(body: Value) -> Result<Vec<Record>, ApiError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(ApiError::Decode("expected a list of records".to_string())),
        },
        _ => return Err(ApiError::Decode("expected a list of records".to_string())),
    };
    Ok(items.into_iter().filter_map(Record::from_value).collect())
}

#[async_trait]
impl RegistryApi for RegistryClient {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Record>, ApiError> {
        let url = format!(
            "{}{}",
            self.config.api_url(),
            self.config.list_route(kind, &self.session)
        );
        tracing::debug!("GET {url}");
        let response = Self::check(self.request(Method::GET, &url).send().await?).await?;
        let body: Value = response.json().await?;
        records_from_body(body)
    }

    async fn fetch(&self, kind: EntityKind, id: &str) -> Result<Record, ApiError> {
        let url = self.url(kind, Some(id));
        tracing::debug!("GET {url}");
        let response = Self::check(self.request(Method::GET, &url).send().await?).await?;
        let body: Value = response.json().await?;
        Record::from_value(body).ok_or_else(|| ApiError::Decode(format!("record {id} has no id")))
    }

    async fn submit(&self, submission: &Submission) -> Result<(), ApiError> {
        let (method, url) = match &submission.target {
            SubmitTarget::Create => (Method::POST, self.url(submission.kind, None)),
            SubmitTarget::Update(id) => (Method::PUT, self.url(submission.kind, Some(id))),
        };
        tracing::debug!("{method} {url}");

        let request = self.request(method, &url);
        let request = match submission.encoding {
            WireEncoding::Json => request.json(&submission.changes.to_json()),
            WireEncoding::Multipart => {
                request.multipart(Self::multipart(submission.changes.to_parts()).await?)
            }
        };
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ApiError> {
        let url = self.url(kind, Some(id));
        tracing::debug!("DELETE {url}");
        Self::check(self.request(Method::DELETE, &url).send().await?).await?;
        Ok(())
    }
}
