//! Values the cache can hold

use crate::domain::pool::{AccountHealth, PoolInfo};
use crate::domain::recommendation::Strategy;
use crate::domain::risk::{MarketConditions, RiskSnapshot, TimedComponents};
use crate::shared::types::{BasisPoints, Wad};

#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Amount(Wad),
    Score(BasisPoints),
    Pool(PoolInfo),
    Snapshot(RiskSnapshot),
    Strategies(Vec<Strategy>),
    Account(AccountHealth),
    History(Vec<TimedComponents>),
    Market(MarketConditions),
}

/// Conversion between a concrete value and its [`CacheValue`] variant
pub trait Cacheable: Clone + Send + Sync + 'static {
    fn into_value(self) -> CacheValue;
    fn from_value(value: &CacheValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_value(self) -> CacheValue {
                CacheValue::$variant(self)
            }

            fn from_value(value: &CacheValue) -> Option<Self> {
                match value {
                    CacheValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Wad, Amount);
cacheable!(BasisPoints, Score);
cacheable!(PoolInfo, Pool);
cacheable!(RiskSnapshot, Snapshot);
cacheable!(Vec<Strategy>, Strategies);
cacheable!(AccountHealth, Account);
cacheable!(Vec<TimedComponents>, History);
cacheable!(MarketConditions, Market);
