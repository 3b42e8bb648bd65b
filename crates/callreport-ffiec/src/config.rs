//! Service configuration.

use std::time::Duration;

/// Production endpoint of the CDR retrieval service.
pub const FFIEC_ENDPOINT: &str =
    "https://cdr.ffiec.gov/public/pws/webservices/retrievalservice.asmx";

/// SOAP action of the `RetrieveFacsimile` operation.
pub const RETRIEVE_FACSIMILE_ACTION: &str =
    "http://cdr.ffiec.gov/public/services/RetrieveFacsimile";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0";

/// Content type of SOAP 1.2 requests.
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Immutable settings for talking to the CDR web service.
///
/// The default value targets the production service. Tests and alternate
/// deployments substitute the endpoint.
///
/// # Example
///
/// ```
/// use callreport_ffiec::FfiecConfig;
/// use std::time::Duration;
///
/// let config = FfiecConfig::default()
///     .with_endpoint("http://127.0.0.1:8080/retrievalservice.asmx")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfiecConfig {
    /// URL the envelope is posted to; also sent as `wsa:To`.
    pub endpoint: String,
    /// `SOAPAction` header and `wsa:Action` value.
    pub soap_action: String,
    /// `User-Agent` header.
    pub user_agent: String,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for FfiecConfig {
    fn default() -> Self {
        Self {
            endpoint: FFIEC_ENDPOINT.to_string(),
            soap_action: RETRIEVE_FACSIMILE_ACTION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FfiecConfig {
    /// Sets the service endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_production() {
        let config = FfiecConfig::default();
        assert_eq!(config.endpoint, FFIEC_ENDPOINT);
        assert_eq!(config.soap_action, RETRIEVE_FACSIMILE_ACTION);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_builders_leave_other_fields() {
        let config = FfiecConfig::default().with_endpoint("http://localhost/svc");
        assert_eq!(config.endpoint, "http://localhost/svc");
        assert_eq!(config.soap_action, RETRIEVE_FACSIMILE_ACTION);
    }
}
