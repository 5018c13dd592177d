//! Common types used across the application

use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::ParseError;

/// Scale of on-chain fixed-point values (18 decimals)
pub const WAD_SCALE: u128 = 1_000_000_000_000_000_000;

/// Upper bound of the basis-point scale (100%)
pub const MAX_BPS: u16 = 10_000;

/// Ethereum account or token address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address with every byte set to `byte`, handy for fixtures
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let decoded = hex::decode(digits).map_err(|e| ParseError::InvalidAddress(format!("{}: {}", s, e)))?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| ParseError::InvalidAddress(format!("{}: expected 20 bytes", s)))?;

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Unordered asset pair, stored with the smaller address first so that
/// (A, B) and (B, A) index the same caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetPairKey {
    base: Address,
    quote: Address,
}

impl AssetPairKey {
    pub fn new(a: Address, b: Address) -> Self {
        if a <= b {
            Self { base: a, quote: b }
        } else {
            Self { base: b, quote: a }
        }
    }

    pub fn base(&self) -> Address {
        self.base
    }

    pub fn quote(&self) -> Address {
        self.quote
    }

    pub fn contains(&self, asset: &Address) -> bool {
        self.base == *asset || self.quote == *asset
    }
}

impl fmt::Display for AssetPairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Pool identifier as indexed by the pool registry contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-point amount with 18-decimal scale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "WadRepr", into = "String")]
pub struct Wad(u128);

/// Gateways send large amounts as decimal strings, small ones as numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum WadRepr {
    Text(String),
    Number(u64),
}

impl TryFrom<WadRepr> for Wad {
    type Error = ParseError;

    fn try_from(repr: WadRepr) -> Result<Self, Self::Error> {
        match repr {
            WadRepr::Text(s) => s
                .trim()
                .parse::<u128>()
                .map(Wad)
                .map_err(|e| ParseError::InvalidAmount(format!("{}: {}", s, e))),
            WadRepr::Number(n) => Ok(Wad(n as u128)),
        }
    }
}

impl From<Wad> for String {
    fn from(wad: Wad) -> Self {
        wad.0.to_string()
    }
}

impl Wad {
    pub const ZERO: Wad = Wad(0);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole-token amount, e.g. `Wad::from_units(100)` is 100 ETH
    pub const fn from_units(units: u64) -> Self {
        Self(units as u128 * WAD_SCALE)
    }

    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::ZERO;
        }
        Self((value * WAD_SCALE as f64) as u128)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / WAD_SCALE as f64
    }

    pub fn saturating_sub(self, other: Wad) -> Wad {
        Wad(self.0.saturating_sub(other.0))
    }

    pub fn saturating_add(self, other: Wad) -> Wad {
        Wad(self.0.saturating_add(other.0))
    }
}

/// Integer basis points in [0, 10000]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u16")]
pub struct BasisPoints(u16);

impl BasisPoints {
    pub const ZERO: BasisPoints = BasisPoints(0);
    pub const NEUTRAL: BasisPoints = BasisPoints(5_000);
    pub const MAX: BasisPoints = BasisPoints(MAX_BPS);

    /// Clamps to the valid range
    pub fn new(value: u32) -> Self {
        Self(value.min(MAX_BPS as u32) as u16)
    }

    /// Rounds and clamps; NaN resolves to zero
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.round().clamp(0.0, MAX_BPS as f64) as u16)
    }

    pub const fn value(&self) -> u16 {
        self.0
    }

    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn as_fraction(&self) -> f64 {
        self.0 as f64 / MAX_BPS as f64
    }
}

impl From<u32> for BasisPoints {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<BasisPoints> for u16 {
    fn from(bp: BasisPoints) -> Self {
        bp.0
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bp", self.0)
    }
}

/// History window requested by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
            Timeframe::Quarter => "90d",
        }
    }

    /// Number of points in the series
    pub fn points(&self) -> usize {
        match self {
            Timeframe::Day => 24,
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Quarter => 90,
        }
    }

    /// Spacing between consecutive points
    pub fn spacing(&self) -> ChronoDuration {
        match self {
            Timeframe::Day => ChronoDuration::hours(1),
            _ => ChronoDuration::days(1),
        }
    }
}

impl FromStr for Timeframe {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            "90d" => Ok(Timeframe::Quarter),
            other => Err(ParseError::InvalidTimeframe(other.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
