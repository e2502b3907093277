use async_trait::async_trait;
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Client, Method, Response,
};
use shared::{
    domain::{FieldValue, FormFields},
    protocol::{HttpReply, AJAX_HEADER_NAME, AJAX_HEADER_VALUE},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Content type a browser gives a file part when it cannot tell.
const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build http client: {0}")]
    ClientBuild(String),
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },
    #[error("invalid content type {content_type:?} for field {field}")]
    InvalidPart { field: String, content_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub method: Method,
    pub url: Url,
    pub fields: FormFields,
}

#[async_trait]
pub trait ModalTransport: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<HttpReply, TransportError>;
    async fn submit(&self, request: SubmitRequest) -> Result<HttpReply, TransportError>;
}

pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Client with a cookie jar; the CSRF cookie set while loading is replayed on submit.
    pub fn new() -> Result<Self, TransportError> {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ModalTransport for HttpTransport {
    async fn fetch(&self, url: &Url) -> Result<HttpReply, TransportError> {
        debug!(%url, "fetching dialog fragment");
        let response = self
            .http
            .get(url.clone())
            .header(AJAX_HEADER_NAME, AJAX_HEADER_VALUE)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;
        read_reply(url, response).await
    }

    async fn submit(&self, request: SubmitRequest) -> Result<HttpReply, TransportError> {
        let SubmitRequest {
            method,
            url,
            fields,
        } = request;
        debug!(%url, %method, fields = fields.len(), "submitting dialog form");

        let builder = self
            .http
            .request(method.clone(), url.clone())
            .header(AJAX_HEADER_NAME, AJAX_HEADER_VALUE);

        // Bodies are not allowed on GET/HEAD, so text fields travel in the query
        // string, as a native form submission would.
        let builder = if method == Method::GET || method == Method::HEAD {
            let query: Vec<(&str, &str)> = fields
                .iter()
                .filter_map(|(name, value)| match value {
                    FieldValue::Text(text) => Some((name, text.as_str())),
                    FieldValue::File(_) => {
                        warn!(field = name, "dropping file field from {method} submission");
                        None
                    }
                })
                .collect();
            builder.query(&query)
        } else {
            builder.multipart(multipart_form(&fields)?)
        };

        let response = builder.send().await.map_err(|e| network_error(&url, e))?;
        read_reply(&url, response).await
    }
}

fn multipart_form(fields: &FormFields) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for (name, value) in fields.iter() {
        form = match value {
            FieldValue::Text(text) => form.text(name.to_string(), text.clone()),
            FieldValue::File(file) => {
                let content_type = file
                    .content_type
                    .as_deref()
                    .unwrap_or(DEFAULT_FILE_CONTENT_TYPE);
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.filename.clone())
                    .mime_str(content_type)
                    .map_err(|_| TransportError::InvalidPart {
                        field: name.to_string(),
                        content_type: content_type.to_string(),
                    })?;
                form.part(name.to_string(), part)
            }
        };
    }
    Ok(form)
}

async fn read_reply(url: &Url, response: Response) -> Result<HttpReply, TransportError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.map_err(|e| TransportError::Body {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(HttpReply {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        content_type,
        body,
    })
}

fn network_error(url: &Url, err: reqwest::Error) -> TransportError {
    TransportError::Network {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
