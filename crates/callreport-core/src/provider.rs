//! Provider traits for fetching filings.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`FacsimileProvider`] - Retrieves decoded XBRL facsimiles for an institution

use async_trait::async_trait;
use std::fmt::Debug;
use tracing::debug;

use crate::{
    error::Result,
    types::{RawFact, ReportingPeriod, RssdId},
    xbrl::extract_facts,
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "FFIEC CDR").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider of XBRL facsimiles.
///
/// Implement this trait to retrieve the filed report of one institution for
/// one reporting period.
#[async_trait]
pub trait FacsimileProvider: DataProvider {
    /// Fetches the decoded XBRL facsimile.
    ///
    /// Returns `Ok(None)` when the service has no facsimile for this
    /// institution and period.
    async fn fetch_facsimile(
        &self,
        rssd_id: RssdId,
        period: &ReportingPeriod,
    ) -> Result<Option<String>>;

    /// Fetches and flattens the facsimile for a raw identifier string.
    ///
    /// The identifier is parsed into an [`RssdId`] first; the returned facts
    /// carry `identifier` exactly as given. `Ok(None)` means no facsimile.
    ///
    /// Default implementation calls [`fetch_facsimile`](Self::fetch_facsimile)
    /// and then [`extract_facts`].
    async fn fetch_facts(
        &self,
        identifier: &str,
        period: &ReportingPeriod,
    ) -> Result<Option<Vec<RawFact>>> {
        let rssd_id: RssdId = identifier.parse()?;

        let Some(document) = self.fetch_facsimile(rssd_id, period).await? else {
            return Ok(None);
        };

        let facts = extract_facts(&document, identifier)?;
        debug!(
            provider = self.name(),
            rssd_id = %rssd_id,
            facts = facts.len(),
            "Extracted facts"
        );
        Ok(Some(facts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallReportError;
    use chrono::NaiveDate;

    #[derive(Debug)]
    struct StaticProvider {
        document: Option<&'static str>,
    }

    impl DataProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        fn description(&self) -> &str {
            "returns a fixed document"
        }
    }

    #[async_trait]
    impl FacsimileProvider for StaticProvider {
        async fn fetch_facsimile(
            &self,
            _rssd_id: RssdId,
            _period: &ReportingPeriod,
        ) -> Result<Option<String>> {
            Ok(self.document.map(str::to_string))
        }
    }

    fn period() -> ReportingPeriod {
        ReportingPeriod::new(NaiveDate::from_ymd_opt(2019, 3, 31).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_facts_tags_identifier() {
        let provider = StaticProvider {
            document: Some(r#"<xbrl><cc:RCON2170 decimals="0">100</cc:RCON2170></xbrl>"#),
        };

        let facts = provider
            .fetch_facts("1842065", &period())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(facts, vec![RawFact::new("1842065", "RCON2170", "100", "0")]);
    }

    #[tokio::test]
    async fn test_fetch_facts_no_data() {
        let provider = StaticProvider { document: None };
        assert!(
            provider
                .fetch_facts("1842065", &period())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_fetch_facts_rejects_bad_identifier() {
        let provider = StaticProvider {
            document: Some("<xbrl/>"),
        };
        let err = provider.fetch_facts("bad", &period()).await.unwrap_err();
        assert!(matches!(err, CallReportError::InvalidIdentifier(_)));
    }
}
