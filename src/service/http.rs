//! HTTP implementations of the two service interfaces.
//!
//! ## Wire format
//!
//! The processing service receives a JSON body with the PDF bytes
//! base64-encoded alongside the instruction — base64-in-JSON keeps the
//! request a single self-describing document and avoids multipart framing:
//!
//! ```json
//! { "filename": "spec.pdf", "pdf_base64": "...", "instruction": "Extract all requirements" }
//! ```
//!
//! and responds with the row envelope. The export service receives
//! `{ "rows": [...] }` and responds with raw workbook bytes.
//!
//! ## Error-mapping policy
//!
//! Every transport outcome maps to exactly one [`IntellidocsError`] variant:
//! request timeout → `ApiTimeout`, connection failure → `ServiceUnreachable`,
//! HTTP 401/403 → `AuthError`, any other non-2xx → `ServiceFailure` with a
//! truncated body excerpt, unparseable body → `InvalidResponse`. Nothing is
//! retried: every error is terminal for the action that triggered it, and
//! nothing throws past the caller's error handling.

use crate::config::ClientConfig;
use crate::error::IntellidocsError;
use crate::model::{Envelope, Record};
use crate::service::{DocumentProcessor, ExportedFile, SpreadsheetExporter, XLSX_MIME};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cap on how much of an error body is echoed into error messages.
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Serialize)]
struct ProcessRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
    pdf_base64: String,
    instruction: &'a str,
}

#[derive(Serialize)]
struct ExportRequest<'a> {
    rows: &'a [Record],
}

/// HTTP client for the document-understanding service.
pub struct HttpProcessor {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl HttpProcessor {
    /// Build a processor client for `url` with the config's timeout.
    pub fn new(url: impl Into<String>, config: &ClientConfig) -> Result<Self, IntellidocsError> {
        let url = url.into();
        Ok(Self {
            client: build_client(&url, config.api_timeout_secs)?,
            url,
            timeout_secs: config.api_timeout_secs,
        })
    }
}

#[async_trait]
impl DocumentProcessor for HttpProcessor {
    async fn process(
        &self,
        pdf_bytes: &[u8],
        instruction: &str,
    ) -> Result<Envelope, IntellidocsError> {
        info!(
            url = %self.url,
            bytes = pdf_bytes.len(),
            "sending document to processing service"
        );
        let body = ProcessRequest {
            filename: None,
            pdf_base64: BASE64.encode(pdf_bytes),
            instruction,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(&self.url, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error(&self.url, status, response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| map_send_error(&self.url, self.timeout_secs, e))?;

        // Row validation happens right here: a row missing `section` or
        // `requirements` fails envelope deserialisation.
        let envelope: Envelope =
            serde_json::from_str(&text).map_err(|e| IntellidocsError::InvalidResponse {
                url: self.url.clone(),
                detail: format!("{e} (body: {})", excerpt(&text)),
            })?;

        debug!(
            success = envelope.success,
            rows = envelope.data.as_ref().map(Vec::len).unwrap_or(0),
            "processing service responded"
        );
        Ok(envelope)
    }
}

/// HTTP client for the spreadsheet-export service.
pub struct HttpExporter {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl HttpExporter {
    /// Build an exporter client for `url` with the config's timeout.
    pub fn new(url: impl Into<String>, config: &ClientConfig) -> Result<Self, IntellidocsError> {
        let url = url.into();
        Ok(Self {
            client: build_client(&url, config.api_timeout_secs)?,
            url,
            timeout_secs: config.api_timeout_secs,
        })
    }
}

#[async_trait]
impl SpreadsheetExporter for HttpExporter {
    async fn export(&self, rows: &[Record]) -> Result<ExportedFile, IntellidocsError> {
        info!(url = %self.url, rows = rows.len(), "requesting workbook export");

        let response = self
            .client
            .post(&self.url)
            .json(&ExportRequest { rows })
            .send()
            .await
            .map_err(|e| map_send_error(&self.url, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error(&self.url, status, response).await);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_send_error(&self.url, self.timeout_secs, e))?;

        if bytes.is_empty() {
            return Err(IntellidocsError::InvalidResponse {
                url: self.url.clone(),
                detail: "export service returned an empty body".into(),
            });
        }

        if let Some(ct) = content_type.as_deref() {
            if !ct.starts_with(XLSX_MIME) {
                warn!(content_type = ct, "export service declared an unexpected MIME type");
            }
        }

        Ok(ExportedFile::xlsx(bytes.to_vec()))
    }
}

// ── Shared plumbing ──────────────────────────────────────────────────────

fn build_client(url: &str, timeout_secs: u64) -> Result<reqwest::Client, IntellidocsError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| IntellidocsError::ServiceUnreachable {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

fn map_send_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> IntellidocsError {
    if e.is_timeout() {
        IntellidocsError::ApiTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        IntellidocsError::ServiceUnreachable {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

async fn map_status_error(
    url: &str,
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> IntellidocsError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return IntellidocsError::AuthError {
            url: url.to_string(),
            status: status.as_u16(),
        };
    }
    let detail = response
        .text()
        .await
        .map(|body| excerpt(&body))
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    IntellidocsError::ServiceFailure {
        url: url.to_string(),
        status: status.as_u16(),
        detail,
    }
}

/// Truncate a response body for inclusion in an error message.
fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() > BODY_EXCERPT_LEN {
        let cut = trimmed
            .char_indices()
            .take_while(|(i, c)| i + c.len_utf8() <= BODY_EXCERPT_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}\u{2026}", &trimmed[..cut])
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_request_serialises_expected_shape() {
        let body = ProcessRequest {
            filename: Some("spec.pdf"),
            pdf_base64: BASE64.encode(b"%PDF-1.7"),
            instruction: "Extract all requirements",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["filename"], "spec.pdf");
        assert_eq!(json["instruction"], "Extract all requirements");
        assert_eq!(
            BASE64.decode(json["pdf_base64"].as_str().unwrap()).unwrap(),
            b"%PDF-1.7"
        );
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let short = excerpt(&long);
        assert!(short.len() <= BODY_EXCERPT_LEN + '\u{2026}'.len_utf8());
        assert!(short.ends_with('\u{2026}'));
        assert_eq!(excerpt("tiny"), "tiny");
    }

    #[test]
    fn excerpt_respects_multibyte_char_boundaries() {
        // 2-byte chars: 150 of them straddle the cap at byte 200.
        let long = "é".repeat(150);
        let short = excerpt(&long);
        assert!(short.len() <= BODY_EXCERPT_LEN + '\u{2026}'.len_utf8());
        assert!(short.ends_with('\u{2026}'));
        // 3- and 4-byte chars around the cap must not split either.
        for body in ["€".repeat(80), "𝄞".repeat(60)] {
            let short = excerpt(&body);
            assert!(short.len() <= BODY_EXCERPT_LEN + '\u{2026}'.len_utf8(), "got {}", short.len());
        }
    }

    #[test]
    fn envelope_with_invalid_row_fails_to_parse() {
        // Simulates the boundary validation applied to service responses.
        let body = r#"{"success":true,"data":[{"section":"Scope"}]}"#;
        let result: Result<Envelope, _> = serde_json::from_str(body);
        assert!(result.is_err());
    }

    // ── Live error mapping against a local one-shot responder ────────────

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Serves exactly one request with a canned HTTP/1.1 response, then
    /// closes. Returns the URL to hit.
    async fn one_shot_server(
        status: &'static str,
        content_type: &'static str,
        body: &'static [u8],
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            drain_request(&mut stream).await;
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).await.unwrap();
            stream.write_all(body).await.unwrap();
        });
        url
    }

    /// Reads one full request (headers + Content-Length body) so the client
    /// never sees a reset while still writing.
    async fn drain_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let body_len = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut missing = body_len.saturating_sub(buf.len() - header_end);
        while missing > 0 {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            missing = missing.saturating_sub(n);
        }
    }

    #[tokio::test]
    async fn processor_parses_a_valid_envelope() {
        let url = one_shot_server(
            "200 OK",
            "application/json",
            br#"{"success":true,"data":[{"section":"Scope","requirements":"All of them"}]}"#,
        )
        .await;
        let processor = HttpProcessor::new(&url, &ClientConfig::default()).unwrap();

        let envelope = processor.process(b"%PDF-1.7", "Extract").await.unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn processor_maps_auth_statuses() {
        let url = one_shot_server("401 Unauthorized", "text/plain", b"missing key").await;
        let processor = HttpProcessor::new(&url, &ClientConfig::default()).unwrap();

        let err = processor.process(b"%PDF-1.7", "Extract").await.unwrap_err();
        assert!(matches!(err, IntellidocsError::AuthError { status: 401, .. }), "got: {err}");
    }

    #[tokio::test]
    async fn processor_maps_server_failures_with_body_excerpt() {
        let url = one_shot_server("500 Internal Server Error", "text/plain", b"model overloaded").await;
        let processor = HttpProcessor::new(&url, &ClientConfig::default()).unwrap();

        let err = processor.process(b"%PDF-1.7", "Extract").await.unwrap_err();
        assert!(
            matches!(
                &err,
                IntellidocsError::ServiceFailure { status: 500, detail, .. }
                    if detail == "model overloaded"
            ),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn processor_rejects_malformed_bodies() {
        let url = one_shot_server("200 OK", "application/json", b"not an envelope").await;
        let processor = HttpProcessor::new(&url, &ClientConfig::default()).unwrap();

        let err = processor.process(b"%PDF-1.7", "Extract").await.unwrap_err();
        assert!(matches!(err, IntellidocsError::InvalidResponse { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn processor_reports_unreachable_endpoints() {
        // Bind then drop so the port is closed by the time the call runs.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);
        let processor = HttpProcessor::new(&url, &ClientConfig::default()).unwrap();

        let err = processor.process(b"%PDF-1.7", "Extract").await.unwrap_err();
        assert!(matches!(err, IntellidocsError::ServiceUnreachable { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn processor_times_out_on_a_stalled_service() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        // Accept the connection but never respond.
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let config = ClientConfig::builder().api_timeout_secs(1).build().unwrap();
        let processor = HttpProcessor::new(&url, &config).unwrap();

        let err = processor.process(b"%PDF-1.7", "Extract").await.unwrap_err();
        assert!(matches!(err, IntellidocsError::ApiTimeout { secs: 1, .. }), "got: {err}");
    }

    #[tokio::test]
    async fn exporter_returns_workbook_bytes() {
        let url = one_shot_server("200 OK", XLSX_MIME, b"PK\x03\x04fake").await;
        let exporter = HttpExporter::new(&url, &ClientConfig::default()).unwrap();

        let file = exporter
            .export(&[Record::new("Scope", "All of them")])
            .await
            .unwrap();
        assert_eq!(file.mime, XLSX_MIME);
        assert_eq!(file.bytes, b"PK\x03\x04fake");
    }

    #[tokio::test]
    async fn exporter_rejects_empty_bodies() {
        let url = one_shot_server("200 OK", XLSX_MIME, b"").await;
        let exporter = HttpExporter::new(&url, &ClientConfig::default()).unwrap();

        let err = exporter
            .export(&[Record::new("Scope", "All of them")])
            .await
            .unwrap_err();
        assert!(matches!(err, IntellidocsError::InvalidResponse { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn exporter_maps_server_failures() {
        let url = one_shot_server("503 Service Unavailable", "text/plain", b"maintenance").await;
        let exporter = HttpExporter::new(&url, &ClientConfig::default()).unwrap();

        let err = exporter
            .export(&[Record::new("Scope", "All of them")])
            .await
            .unwrap_err();
        assert!(
            matches!(
                &err,
                IntellidocsError::ServiceFailure { status: 503, detail, .. }
                    if detail == "maintenance"
            ),
            "got: {err}"
        );
    }
}
