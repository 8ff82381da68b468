//! Extraction service client (Anthropic Messages API).
//!
//! Sends the receipt PDF as a base64 document block together with a
//! fixed instruction and returns the model's raw text reply. Decoding
//! that reply is docuparse-core's job, not this client's.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use docuparse_core::ExtractionConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Fixed natural-language instruction sent with every receipt.
pub const EXTRACTION_PROMPT: &str = "\
Extract the following data from this receipt:
1. The store name, without any legal form suffix - just 'REWE' or 'Edeka'.
2. A spending category, for example 'Groceries', 'Restaurant' or 'Electronics'.
3. The purchase date without time of day, in ISO-8601 format.
4. The total price.
5. Every line item including its price.

If the same item was bought multiple times, write the summed price and put \
the count in front of the name (e.g. '4x Bread'), except for deposit lines. \
If an item carries a deposit, add the deposit to the item's price. If deposits \
were returned, treat each as a negative number and merge all returned deposits \
into a single 'Deposit' line. Append the weight to the name of loose produce \
such as fruit or vegetables.

Return the data as JSON with these keys and types: 'store' (string), \
'category' (string), 'date' (string), 'items' (array of objects), \
'total' (number). Each item object has the keys 'item_name' (string) and \
'item_price' (number).

If this PDF is not a receipt, return 'error'.";

/// Errors from the extraction service call.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The PDF could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Transport-level failure.
    #[error("extraction request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("extraction service returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The reply carried no text content block.
    #[error("extraction response contained no text content")]
    NoTextContent,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for the document-understanding service.
pub struct ExtractionClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ExtractionClient {
    /// Build a client from config and the API key.
    ///
    /// No request timeout: large receipts take as long as they take and
    /// the pipeline processes documents sequentially anyway.
    pub fn new(config: &ExtractionConfig, api_key: String) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent("docuparse-cli/0.1.0")
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Analyze a receipt PDF and return the raw response text.
    pub async fn analyze_pdf(&self, pdf_path: &Path) -> Result<String, ExtractionError> {
        let pdf_bytes = fs::read(pdf_path).map_err(|source| ExtractionError::Read {
            path: pdf_path.display().to_string(),
            source,
        })?;
        let pdf_data = BASE64.encode(&pdf_bytes);
        debug!(
            "sending {} ({} bytes) to extraction service",
            pdf_path.display(),
            pdf_bytes.len()
        );

        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "document",
                        "source": {
                            "type": "base64",
                            "media_type": "application/pdf",
                            "data": pdf_data,
                        },
                    },
                    {"type": "text", "text": EXTRACTION_PROMPT},
                ],
            }],
        });

        let response = self
            .http
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Status { status, body });
        }

        let reply: MessagesResponse = response.json().await?;
        reply
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or(ExtractionError::NoTextContent)
    }
}
