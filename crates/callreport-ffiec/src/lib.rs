#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/callreport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! FFIEC CDR provider for Call Report facsimiles.
//!
//! This crate provides access to the public CDR retrieval web service:
//!
//! - SOAP 1.2 request construction with a WS-Security username token
//! - HTTP transport with the headers the service requires
//! - Unwrapping of the base64 XBRL facsimile from the response
//!
//! # Example
//!
//! ```no_run
//! use callreport_core::{Credentials, FacsimileProvider, ReportingPeriod};
//! use callreport_ffiec::{FfiecConfig, FfiecProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("username", "security-token");
//!     let provider = FfiecProvider::new(credentials, FfiecConfig::default())?;
//!
//!     let period: ReportingPeriod = "2019-03-31".parse()?;
//!     if let Some(facts) = provider.fetch_facts("1842065", &period).await? {
//!         println!("Retrieved {} facts", facts.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use callreport_core::{
    CallReportError, Credentials, DataProvider, FacsimileProvider, ReportingPeriod, Result,
    RssdId,
};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use tracing::debug;

mod config;
mod envelope;
mod response;

pub use config::{
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, FFIEC_ENDPOINT, FfiecConfig, RETRIEVE_FACSIMILE_ACTION,
    SOAP_CONTENT_TYPE,
};
pub use envelope::build_request;
pub use response::unwrap_facsimile;

/// FFIEC Central Data Repository provider.
///
/// Holds the credentials for the session; each request embeds them in a
/// WS-Security header.
#[derive(Debug)]
pub struct FfiecProvider {
    client: reqwest::Client,
    credentials: Credentials,
    config: FfiecConfig,
}

impl FfiecProvider {
    /// Create a new provider with an HTTP client built from `config`.
    ///
    /// # Example
    /// ```
    /// use callreport_core::Credentials;
    /// use callreport_ffiec::{FfiecConfig, FfiecProvider};
    ///
    /// let provider = FfiecProvider::new(
    ///     Credentials::new("username", "security-token"),
    ///     FfiecConfig::default(),
    /// )
    /// .unwrap();
    /// ```
    pub fn new(credentials: Credentials, config: FfiecConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| CallReportError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, credentials, config))
    }

    /// Create a new provider with a custom HTTP client.
    ///
    /// The client's own timeout applies; the configured `User-Agent` is still
    /// sent on every request.
    pub fn with_client(
        client: reqwest::Client,
        credentials: Credentials,
        config: FfiecConfig,
    ) -> Self {
        Self {
            client,
            credentials,
            config,
        }
    }

    /// Returns the service configuration.
    #[must_use]
    pub const fn config(&self) -> &FfiecConfig {
        &self.config
    }

    /// Posts a SOAP envelope and returns the raw response body.
    ///
    /// # Errors
    ///
    /// - [`CallReportError::Network`] if the request could not be completed
    /// - [`CallReportError::Transport`] if the service answers with a non-2xx status
    pub async fn send(&self, envelope: String) -> Result<String> {
        debug!(endpoint = %self.config.endpoint, "Posting RetrieveFacsimile request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(USER_AGENT, &self.config.user_agent)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", &self.config.soap_action)
            .body(envelope)
            .send()
            .await
            .map_err(|e| CallReportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CallReportError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(CallReportError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

impl DataProvider for FfiecProvider {
    fn name(&self) -> &str {
        "FFIEC CDR"
    }

    fn description(&self) -> &str {
        "FFIEC Central Data Repository public web service for Call Report XBRL facsimiles"
    }
}

#[async_trait]
impl FacsimileProvider for FfiecProvider {
    async fn fetch_facsimile(
        &self,
        rssd_id: RssdId,
        period: &ReportingPeriod,
    ) -> Result<Option<String>> {
        let envelope = build_request(rssd_id, period, &self.credentials, &self.config)?;
        let response = self.send(envelope).await?;
        let facsimile = unwrap_facsimile(&response)?;

        debug!(
            rssd_id = %rssd_id,
            period = %period,
            bytes = facsimile.as_ref().map_or(0, String::len),
            "Unwrapped facsimile"
        );
        Ok(facsimile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use callreport_core::RawFact;
    use chrono::NaiveDate;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const INSTANCE: &str = r#"<xbrl xmlns="http://www.xbrl.org/2003/instance" xmlns:cc="http://www.ffiec.gov/xbrl/call/concepts">
  <cc:RCON2170 contextRef="c1" unitRef="USD" decimals="0">2150000</cc:RCON2170>
</xbrl>"#;

    fn soap_response(result: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope"><soap:Body><RetrieveFacsimileResponse xmlns="http://cdr.ffiec.gov/public/services"><RetrieveFacsimileResult>{result}</RetrieveFacsimileResult></RetrieveFacsimileResponse></soap:Body></soap:Envelope>"#
        )
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    /// Serves one canned HTTP response and hands back the raw request.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/soap+xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}/retrievalservice.asmx"), handle)
    }

    fn provider(endpoint: &str) -> FfiecProvider {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        FfiecProvider::with_client(
            client,
            Credentials::new("jdoe", "token123"),
            FfiecConfig::default().with_endpoint(endpoint),
        )
    }

    fn period() -> ReportingPeriod {
        ReportingPeriod::new(NaiveDate::from_ymd_opt(2019, 3, 31).unwrap())
    }

    #[test]
    fn test_provider_traits() {
        let provider =
            FfiecProvider::new(Credentials::new("u", "p"), FfiecConfig::default()).unwrap();

        assert_eq!(provider.name(), "FFIEC CDR");
        assert!(!provider.description().is_empty());
        assert_eq!(provider.config().endpoint, FFIEC_ENDPOINT);
    }

    #[test]
    fn test_debug_hides_passphrase() {
        let provider =
            FfiecProvider::new(Credentials::new("u", "hunter2"), FfiecConfig::default()).unwrap();
        assert!(!format!("{provider:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn test_fetch_facts_from_mock_endpoint() {
        let (url, server) = serve_once("200 OK", soap_response(&BASE64.encode(INSTANCE))).await;
        let provider = provider(&url);

        let facts = provider
            .fetch_facts("1842065", &period())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(facts, vec![RawFact::new("1842065", "RCON2170", "2150000", "0")]);

        let request = server.await.unwrap();
        let lowered = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /retrievalservice.asmx"));
        assert!(lowered.contains("content-type: application/soap+xml; charset=utf-8"));
        assert!(lowered.contains(
            "soapaction: http://cdr.ffiec.gov/public/services/retrievefacsimile"
        ));
        assert!(lowered.contains("user-agent: mozilla/5.0"));
        assert!(request.contains("<fiID>1842065</fiID>"));
        assert!(request.contains("<reportingPeriodEndDate>2019/03/31</reportingPeriodEndDate>"));
        assert!(request.contains("<wsse:Username>jdoe</wsse:Username>"));
    }

    #[tokio::test]
    async fn test_empty_result_is_no_data() {
        let (url, server) = serve_once("200 OK", soap_response("")).await;
        let provider = provider(&url);

        let facts = provider.fetch_facts("1842065", &period()).await.unwrap();
        assert!(facts.is_none());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let (url, server) = serve_once("500 Internal Server Error", "fault".to_string()).await;
        let provider = provider(&url);

        let err = provider.fetch_facts("1842065", &period()).await.unwrap_err();
        match err {
            CallReportError::Transport { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "fault");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = provider(&format!("http://{addr}/retrievalservice.asmx"));
        let err = provider.fetch_facts("1842065", &period()).await.unwrap_err();
        assert!(matches!(err, CallReportError::Network(_)));
    }
}
