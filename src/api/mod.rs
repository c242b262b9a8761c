//! HTTP client for the backend REST services.
//!
//! Two collaborator backends sit behind this client: the RAG service
//! (knowledge bases, documents, chat) and the carbon/report service
//! (emission report downloads, company lookups, data import). Every
//! endpoint is a JSON POST; non-binary responses arrive wrapped in the
//! `{code, msg?, data?}` envelope, binary downloads arrive as raw bytes
//! with a `Content-Disposition` filename.

pub mod types;

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use url::Url;

use crate::carbon::DataImportPayload;
use crate::config::ApiConfig;
use crate::error::{IbotError, Result};
use types::{
    CompanySummary, Document, DocumentStatus, DownloadedFile, Envelope, ImportSummary,
    KnowledgeBase, SUCCESS_CODE,
};

/// Client for the non-streaming REST endpoints.
///
/// Cheap to clone; holds a pooled [`reqwest::Client`] plus the two resolved
/// base URLs. Streaming chat lives in
/// [`StreamingChatClient`](crate::chat::stream::StreamingChatClient), which
/// deliberately uses its own client without a total request timeout.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    carbon_base_url: Url,
    poll_interval: Duration,
    poll_deadline: Duration,
}

impl ApiClient {
    /// Create a client from the API configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`IbotError::Config`] if either base URL fails to parse, or
    /// an error if the HTTP client cannot be initialized.
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .connect_timeout(Duration::from_secs(api.connect_timeout_seconds))
            .user_agent(format!("ibot/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: api.base_url()?,
            carbon_base_url: api.carbon_base_url()?,
            poll_interval: Duration::from_secs(api.poll_interval_seconds),
            poll_deadline: Duration::from_secs(api.poll_deadline_seconds),
        })
    }

    /// List all knowledge bases.
    pub async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>> {
        let bases = self
            .post_envelope(&self.base_url, "dataset/read", &serde_json::json!({}))
            .await?;
        Ok(bases.unwrap_or_default())
    }

    /// Create a knowledge base with the given name and description.
    pub async fn create_knowledge_base(&self, name: &str, description: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(
                IbotError::Precondition("knowledge base name must not be empty".to_string())
                    .into(),
            );
        }
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "user_id": 1,
        });
        self.post_envelope::<_, serde_json::Value>(&self.base_url, "dataset/create", &body)
            .await?;
        tracing::info!(name, "created knowledge base");
        Ok(())
    }

    /// Delete a knowledge base and everything in it.
    pub async fn delete_knowledge_base(&self, id: i64) -> Result<()> {
        let body = serde_json::json!({ "id": id });
        self.post_envelope::<_, serde_json::Value>(&self.base_url, "dataset/delete", &body)
            .await?;
        tracing::info!(id, "deleted knowledge base");
        Ok(())
    }

    /// List the documents of one knowledge base.
    pub async fn list_documents(&self, knowledge_base_id: i64) -> Result<Vec<Document>> {
        let body = serde_json::json!({ "knowledge_base_id": knowledge_base_id });
        let docs = self
            .post_envelope(&self.base_url, "document/read", &body)
            .await?;
        Ok(docs.unwrap_or_default())
    }

    /// Upload a local file into a knowledge base.
    ///
    /// The file is sent as the multipart `file` field with its on-disk name;
    /// parsing does not start automatically, see [`start_parse`](Self::start_parse).
    pub async fn upload_document(&self, knowledge_base_id: i64, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                IbotError::Precondition(format!("invalid file path: {}", path.display()))
            })?;
        let contents = tokio::fs::read(path).await?;
        tracing::debug!(
            file = %file_name,
            bytes = contents.len(),
            knowledge_base_id,
            "uploading document"
        );

        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name.clone());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("knowledge_base_id", knowledge_base_id.to_string());

        let url = endpoint(&self.base_url, "document/upload")?;
        let response = self.http.post(url).multipart(form).send().await?;
        let envelope: Envelope<serde_json::Value> = check_status(response).await?.json().await?;
        expect_success(&envelope)?;
        tracing::info!(file = %file_name, "uploaded document");
        Ok(())
    }

    /// Start parsing a freshly uploaded document.
    pub async fn start_parse(&self, document_id: i64) -> Result<()> {
        let body = serde_json::json!({ "id": document_id });
        self.post_envelope::<_, serde_json::Value>(&self.base_url, "document/parse/start", &body)
            .await?;
        Ok(())
    }

    /// Re-parse a document that already completed or failed.
    pub async fn reparse_document(&self, document_id: i64) -> Result<()> {
        let body = serde_json::json!({ "id": document_id });
        self.post_envelope::<_, serde_json::Value>(&self.base_url, "document/parse/reparse", &body)
            .await?;
        Ok(())
    }

    /// Delete a document from its knowledge base.
    pub async fn delete_document(&self, id: i64) -> Result<()> {
        let body = serde_json::json!({ "id": id });
        self.post_envelope::<_, serde_json::Value>(&self.base_url, "document/delete", &body)
            .await?;
        tracing::info!(id, "deleted document");
        Ok(())
    }

    /// Poll a document until its parse reaches a terminal status.
    ///
    /// Checks every poll interval and gives up after the configured
    /// deadline. The status endpoint has no per-document read, so each poll
    /// re-reads the knowledge base's document list.
    ///
    /// # Errors
    ///
    /// Returns [`IbotError::Precondition`] if the document disappears from
    /// the knowledge base, or [`IbotError::Transport`] if the deadline
    /// passes with parsing still in flight.
    pub async fn wait_for_parse(
        &self,
        knowledge_base_id: i64,
        document_id: i64,
    ) -> Result<DocumentStatus> {
        let deadline = Instant::now() + self.poll_deadline;
        loop {
            let documents = self.list_documents(knowledge_base_id).await?;
            let Some(doc) = documents.iter().find(|d| d.id == document_id) else {
                return Err(IbotError::Precondition(format!(
                    "document {document_id} not found in knowledge base {knowledge_base_id}"
                ))
                .into());
            };
            if doc.status.is_terminal() {
                return Ok(doc.status);
            }
            if Instant::now() >= deadline {
                return Err(IbotError::Transport(format!(
                    "document {document_id} still {} after {}s",
                    doc.status,
                    self.poll_deadline.as_secs()
                ))
                .into());
            }
            tracing::debug!(document_id, status = %doc.status, "parse still running");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Download a document's original file.
    pub async fn download_document(&self, id: i64) -> Result<DownloadedFile> {
        let body = serde_json::json!({ "id": id });
        self.post_download(&self.base_url, "document/download", &body)
            .await
    }

    /// Download the generated emission report for one company.
    pub async fn download_report(&self, company_name: &str) -> Result<DownloadedFile> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(
                IbotError::Precondition("company name must not be empty".to_string()).into(),
            );
        }
        let body = serde_json::json!({ "company_name": company_name });
        self.post_download(&self.carbon_base_url, "download_report", &body)
            .await
    }

    /// Download the blank data-intake template.
    pub async fn download_template(&self) -> Result<DownloadedFile> {
        self.post_download(&self.carbon_base_url, "download_template", &serde_json::json!({}))
            .await
    }

    /// List the companies known to the report backend.
    pub async fn fetch_company_list(&self) -> Result<Vec<CompanySummary>> {
        let companies = self
            .post_envelope(
                &self.carbon_base_url,
                "fetch_compony_list",
                &serde_json::json!({}),
            )
            .await?;
        Ok(companies.unwrap_or_default())
    }

    /// Fetch everything stored for one company, as reported by the server.
    ///
    /// The payload shape varies with the backend version, so it is returned
    /// as raw JSON for display rather than deserialized into domain types.
    pub async fn company_by_name(&self, name: &str) -> Result<serde_json::Value> {
        let body = serde_json::json!({ "name": name });
        let data: Option<serde_json::Value> = self
            .post_envelope(&self.carbon_base_url, "company_by_name", &body)
            .await?;
        data.ok_or_else(|| {
            IbotError::Transport(format!("no data returned for company {name}")).into()
        })
    }

    /// Submit a complete carbon-data bundle in one transaction.
    pub async fn import_carbon_data(&self, payload: &DataImportPayload) -> Result<ImportSummary> {
        let summary: Option<ImportSummary> = self
            .post_envelope(&self.carbon_base_url, "import_carbon_data", payload)
            .await?;
        summary.ok_or_else(|| {
            IbotError::Transport("import acknowledged without a summary".to_string()).into()
        })
    }

    /// POST a JSON body and unwrap the response envelope.
    ///
    /// Non-2xx statuses and envelope codes other than 200 both become
    /// errors; `data` may legitimately be absent for write operations.
    async fn post_envelope<B, T>(&self, base: &Url, path: &str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint(base, path)?;
        tracing::debug!(%url, "api request");
        let response = self.http.post(url).json(body).send().await?;
        let envelope: Envelope<T> = check_status(response).await?.json().await?;
        expect_success(&envelope)?;
        Ok(envelope.data)
    }

    /// POST a JSON body and collect a binary response.
    async fn post_download(
        &self,
        base: &Url,
        path: &str,
        body: &impl Serialize,
    ) -> Result<DownloadedFile> {
        let url = endpoint(base, path)?;
        tracing::debug!(%url, "download request");
        let response = self.http.post(url).json(body).send().await?;
        let response = check_status(response).await?;

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition);
        let bytes = response.bytes().await?;
        tracing::info!(bytes = bytes.len(), ?filename, "download complete");
        Ok(DownloadedFile { filename, bytes })
    }
}

/// Resolve an endpoint path against a base URL.
fn endpoint(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| IbotError::Config(format!("invalid endpoint {path}: {e}")).into())
}

/// Turn a non-2xx response into a transport error carrying the body text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let path = response.url().path().to_string();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(IbotError::Transport(format!("HTTP {status} from {path}: {body}")).into())
}

/// Reject envelopes whose code signals an application-level failure.
fn expect_success<T>(envelope: &Envelope<T>) -> Result<()> {
    if envelope.code == SUCCESS_CODE {
        return Ok(());
    }
    Err(IbotError::Api {
        code: envelope.code,
        msg: envelope
            .msg
            .clone()
            .unwrap_or_else(|| "no message".to_string()),
    }
    .into())
}

/// Extract the suggested filename from a `Content-Disposition` header.
///
/// Prefers the RFC 5987 `filename*=UTF-8''...` form, which carries
/// percent-encoded UTF-8 and is what the backend uses for Chinese report
/// names, then falls back to the plain `filename=` token with optional
/// quoting. Returns `None` when neither form is present or the decoded name
/// is empty.
fn filename_from_content_disposition(header: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for segment in header.split(';') {
        let segment = segment.trim();
        if let Some(encoded) = strip_prefix_ignore_case(segment, "filename*=") {
            // RFC 5987: charset'language'percent-encoded-bytes
            let mut parts = encoded.splitn(3, '\'');
            let charset = parts.next().unwrap_or_default();
            let _language = parts.next();
            let Some(value) = parts.next() else { continue };
            if !charset.eq_ignore_ascii_case("utf-8") {
                continue;
            }
            let decoded = percent_decode(value);
            let name = String::from_utf8_lossy(&decoded).into_owned();
            if !name.is_empty() {
                return Some(name);
            }
        } else if let Some(value) = strip_prefix_ignore_case(segment, "filename=") {
            let name = value.trim_matches('"').trim();
            if !name.is_empty() {
                plain = Some(name.to_string());
            }
        }
    }

    plain
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if value.len() >= prefix.len() && value[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}

/// Decode percent-escapes into raw bytes.
///
/// Escapes are decoded byte-wise before any UTF-8 interpretation so that
/// multi-byte characters split across several `%XX` escapes reassemble
/// correctly. Invalid escapes are passed through untouched.
fn percent_decode(input: &str) -> Vec<u8> {
    let raw = input.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' && i + 2 < raw.len() {
            let high = (raw[i + 1] as char).to_digit(16);
            let low = (raw[i + 2] as char).to_digit(16);
            if let (Some(high), Some(low)) = (high, low) {
                out.push((high as u8) << 4 | low as u8);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    out
}
