//! Paginated options contract lookup.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use newsflow_alpaca::{Brokerage, ContractQuery, OptionContract};
use newsflow_core::OptionRight;
use tracing::debug;

use crate::error::ExecutionError;

/// Lists every contract for an underlying within an expiration window.
#[derive(Clone)]
pub struct ContractFinder {
    broker: Arc<dyn Brokerage>,
    page_size: u32,
}

impl ContractFinder {
    pub fn new(broker: Arc<dyn Brokerage>) -> Self {
        Self {
            broker,
            page_size: ContractQuery::DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Follows continuation tokens until exhausted and concatenates pages.
    ///
    /// An empty window is `Ok(vec![])`.
    ///
    /// # Errors
    /// Returns [`ExecutionError::ContractFetch`] if any page request fails,
    /// discarding pages already read, or if the API hands back a token it
    /// already served.
    pub async fn find_contracts(
        &self,
        symbol: &str,
        expiration_from: NaiveDate,
        expiration_to: NaiveDate,
        right: OptionRight,
    ) -> Result<Vec<OptionContract>, ExecutionError> {
        let query = ContractQuery::new(symbol, expiration_from, expiration_to, right)
            .with_limit(self.page_size);

        let mut contracts = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            let page = self
                .broker
                .list_option_contracts(&query, page_token.as_deref())
                .await
                .map_err(|e| {
                    ExecutionError::contract_fetch(symbol, format!("page {page_number}: {e}"))
                })?;

            debug!(
                symbol,
                page = page_number,
                count = page.contracts.len(),
                "Fetched contracts page"
            );
            contracts.extend(page.contracts);

            let Some(token) = page.next_page_token.filter(|t| !t.is_empty()) else {
                return Ok(contracts);
            };
            if !seen_tokens.insert(token.clone()) {
                return Err(ExecutionError::contract_fetch(
                    symbol,
                    format!("page token {token} repeated after page {page_number}"),
                ));
            }
            page_token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{contract, MockBrokerage};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_concatenates_all_pages() {
        let broker = Arc::new(MockBrokerage::new().with_contract_pages(vec![
            vec![
                contract("AAPL", date(2025, 7, 18), dec!(190), OptionRight::Call),
                contract("AAPL", date(2025, 7, 18), dec!(200), OptionRight::Call),
            ],
            vec![contract("AAPL", date(2025, 8, 15), dec!(195), OptionRight::Call)],
            vec![contract("AAPL", date(2025, 9, 19), dec!(210), OptionRight::Call)],
        ]));
        let finder = ContractFinder::new(broker.clone());

        let found = finder
            .find_contracts("AAPL", date(2025, 7, 11), date(2025, 10, 9), OptionRight::Call)
            .await
            .unwrap();

        assert_eq!(found.len(), 4);
        assert_eq!(broker.contract_requests().len(), 3);
        assert_eq!(broker.contract_requests()[1].1.as_deref(), Some("page-1"));
    }

    #[tokio::test]
    async fn test_empty_window_is_not_an_error() {
        let broker = Arc::new(MockBrokerage::new());
        let finder = ContractFinder::new(broker);

        let found = finder
            .find_contracts("AAPL", date(2025, 7, 11), date(2025, 10, 9), OptionRight::Put)
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_failed_page_fails_whole_lookup() {
        let broker = Arc::new(
            MockBrokerage::new()
                .with_contract_pages(vec![
                    vec![contract("AAPL", date(2025, 7, 18), dec!(190), OptionRight::Call)],
                    vec![contract("AAPL", date(2025, 8, 15), dec!(195), OptionRight::Call)],
                ])
                .fail_contract_page(1),
        );
        let finder = ContractFinder::new(broker);

        let err = finder
            .find_contracts("AAPL", date(2025, 7, 11), date(2025, 10, 9), OptionRight::Call)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::ContractFetch { .. }));
    }

    #[tokio::test]
    async fn test_long_chain_is_read_to_the_end() {
        let pages: Vec<Vec<OptionContract>> = (0..60)
            .map(|i| {
                vec![contract(
                    "SPY",
                    date(2025, 7, 18),
                    dec!(400) + Decimal::from(i),
                    OptionRight::Call,
                )]
            })
            .collect();
        let broker = Arc::new(MockBrokerage::new().with_contract_pages(pages));
        let finder = ContractFinder::new(broker.clone());

        let found = finder
            .find_contracts("SPY", date(2025, 7, 11), date(2025, 10, 9), OptionRight::Call)
            .await
            .unwrap();

        assert_eq!(found.len(), 60);
        assert_eq!(broker.contract_requests().len(), 60);
        assert_eq!(found[59].strike_price, dec!(459));
    }

    #[tokio::test]
    async fn test_repeated_page_token_stops_lookup() {
        let broker = Arc::new(
            MockBrokerage::new()
                .with_contract_pages(vec![
                    vec![contract("AAPL", date(2025, 7, 18), dec!(190), OptionRight::Call)],
                    vec![contract("AAPL", date(2025, 8, 15), dec!(195), OptionRight::Call)],
                ])
                .loop_last_contract_page(),
        );
        let finder = ContractFinder::new(broker.clone());

        let err = finder
            .find_contracts("AAPL", date(2025, 7, 11), date(2025, 10, 9), OptionRight::Call)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::ContractFetch { .. }));
        assert_eq!(broker.contract_requests().len(), 2);
    }

    #[test]
    fn test_default_page_size_is_api_maximum() {
        let query = ContractQuery::new(
            "SPY",
            date(2025, 7, 11),
            date(2025, 10, 9),
            OptionRight::Call,
        );
        assert_eq!(query.limit, 10_000);
    }
}
