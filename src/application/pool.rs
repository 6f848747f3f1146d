//! Bounded worker pool for profit evaluation.
//!
//! Evaluations run on tokio's blocking threads, at most `size` at a time,
//! so depth walks never stall the I/O workers driving feeds and orders.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::profit::{ProfitEstimate, ProfitRequest};

pub struct ProfitPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl ProfitPool {
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Size to the machine, leaving `reserved` cores to the async runtime.
    #[must_use]
    pub fn for_available_cores(reserved: usize) -> Self {
        Self::new(num_cpus::get().saturating_sub(reserved))
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run one evaluation on the pool.
    ///
    /// Once the pool is closed the evaluation runs inline instead; the
    /// result is the same either way.
    pub async fn evaluate(&self, request: ProfitRequest) -> Option<ProfitEstimate> {
        let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
            debug!("Profit pool closed, evaluating inline");
            return request.evaluate();
        };

        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            request.evaluate()
        });

        match task.await {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!(error = %e, "Profit evaluation task failed");
                None
            }
        }
    }

    /// Stop handing out worker slots.
    pub fn close(&self) {
        self.permits.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::PriceLevel;
    use rust_decimal_macros::dec;

    fn request() -> ProfitRequest {
        ProfitRequest {
            asks_to_buy: vec![PriceLevel::new(dec!(100), dec!(2)), PriceLevel::new(dec!(100.5), dec!(1))],
            bids_to_sell: vec![PriceLevel::new(dec!(101), dec!(1.2)), PriceLevel::new(dec!(100.8), dec!(3))],
            buy_fee: dec!(0.001),
            sell_fee: dec!(0.001),
            max_notional: dec!(250),
        }
    }

    #[test]
    fn size_is_at_least_one() {
        assert_eq!(ProfitPool::new(0).size(), 1);
        assert!(ProfitPool::for_available_cores(usize::MAX).size() >= 1);
    }

    #[tokio::test]
    async fn pooled_result_matches_inline() {
        let pool = ProfitPool::new(2);
        let expected = request().evaluate();
        assert!(expected.is_some());
        assert_eq!(pool.evaluate(request()).await, expected);
    }

    #[tokio::test]
    async fn closed_pool_still_answers() {
        let pool = ProfitPool::new(2);
        pool.close();
        assert!(pool.is_closed());
        assert_eq!(pool.evaluate(request()).await, request().evaluate());
    }

    #[tokio::test]
    async fn concurrent_evaluations_share_slots() {
        let pool = Arc::new(ProfitPool::new(1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                tokio::spawn(async move { pool.evaluate(request()).await })
            })
            .collect();

        let expected = request().evaluate();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), expected);
        }
    }
}
