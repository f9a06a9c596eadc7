//! Collateral price feed and freshness validation

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::math::Wad;

/// A single price reading: collateral price in base-asset terms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: Wad,
    pub observed_at: u64,
}

/// Trait for pluggable price feeds
///
/// Returns `None` when the feed has nothing to report (network failure,
/// feed not yet published).
pub trait PriceSource {
    fn latest(&self) -> Option<PriceObservation>;
}

/// Wraps a [`PriceSource`] and rejects absent, zero or stale readings
#[derive(Clone, Debug)]
pub struct PriceOracleAdapter<P> {
    source: P,
    max_age: u64,
}

impl<P: PriceSource> PriceOracleAdapter<P> {
    pub fn new(source: P, max_age: u64) -> Self {
        Self { source, max_age }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    /// Fetch a price that is fresh as of `now`
    ///
    /// # Errors
    /// * `StalePrice` if the feed is empty, the price is zero, `observed_at`
    ///   is zero or later than `now`, or the observation is older than `max_age`
    pub fn fetch_price(&self, now: u64) -> Result<PriceObservation> {
        let observation = self.source.latest().ok_or(LedgerError::StalePrice)?;
        if observation.observed_at == 0 || observation.price.is_zero() {
            return Err(LedgerError::StalePrice);
        }
        if observation.observed_at > now {
            log::warn!(
                "oracle: price {} observed at {} is ahead of now {}",
                observation.price,
                observation.observed_at,
                now
            );
            return Err(LedgerError::StalePrice);
        }
        if now.saturating_sub(observation.observed_at) > self.max_age {
            log::warn!(
                "oracle: stale price {} observed at {} (now {}, max age {})",
                observation.price,
                observation.observed_at,
                now,
                self.max_age
            );
            return Err(LedgerError::StalePrice);
        }
        Ok(observation)
    }

    /// True if a cached observation taken at `observed_at` is unusable at `now`
    ///
    /// A cached price was accepted when fetched, so a clock that has since
    /// moved back behind it counts as zero age rather than stale.
    pub fn is_stale(&self, observed_at: u64, now: u64) -> bool {
        observed_at == 0 || now.saturating_sub(observed_at) > self.max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Fixed(Cell<Option<PriceObservation>>);

    impl PriceSource for Fixed {
        fn latest(&self) -> Option<PriceObservation> {
            self.0.get()
        }
    }

    fn adapter(obs: Option<PriceObservation>) -> PriceOracleAdapter<Fixed> {
        PriceOracleAdapter::new(Fixed(Cell::new(obs)), 300)
    }

    fn obs(price: u128, at: u64) -> Option<PriceObservation> {
        Some(PriceObservation {
            price: Wad::from_int(price).unwrap(),
            observed_at: at,
        })
    }

    #[test]
    fn test_fresh_price_accepted() {
        let a = adapter(obs(10, 1_000));
        assert_eq!(a.fetch_price(1_300).unwrap().price, Wad::from_int(10).unwrap());
    }

    #[test]
    fn test_old_price_rejected() {
        let a = adapter(obs(10, 1_000));
        assert_eq!(a.fetch_price(1_301), Err(LedgerError::StalePrice));
        assert!(a.fetch_price(1_300).is_ok());
        // Observed after the operation time
        assert_eq!(a.fetch_price(999), Err(LedgerError::StalePrice));
        assert!(a.fetch_price(1_000).is_ok());
    }

    #[test]
    fn test_missing_zero_price_and_zero_timestamp_rejected() {
        assert_eq!(adapter(None).fetch_price(5), Err(LedgerError::StalePrice));
        assert_eq!(adapter(obs(0, 5)).fetch_price(5), Err(LedgerError::StalePrice));
        assert_eq!(adapter(obs(10, 0)).fetch_price(5), Err(LedgerError::StalePrice));
    }

    #[test]
    fn test_is_stale() {
        let a = adapter(None);
        assert!(a.is_stale(0, 10));
        assert!(!a.is_stale(10, 310));
        assert!(a.is_stale(10, 311));
    }
}
