//! Currency-Tagged Money and Exchange Rate Conversion
//!
//! Amounts are carried as [`Money<C>`], where `C` is a zero-sized currency
//! marker. Adding a USD amount to a local-currency amount does not compile;
//! crossing currencies always goes through [`to_local`] or [`to_usd`] with an
//! explicit [`Rate`].
//!
//! A [`Rate`] is the number of local-currency units one US dollar buys. It can
//! only be constructed from a finite value greater than zero, so conversions
//! never divide by zero and never produce `NaN`.
//!
//! # Example
//! ```
//! use exchange_rates::{Money, Rate, USD, VES};
//!
//! let rate = Rate::new(36.5).unwrap();
//! let price = Money::<USD>::from_minor(1000); // $10.00
//!
//! let local: Money<VES> = exchange_rates::to_local(price, rate);
//! assert_eq!(local.minor_units(), 36500); // Bs.365.00
//! ```

use std::fmt;
use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─────────────────────────────────────────────────────────────────────────────
// Currency Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait defining currency metadata.
pub trait Currency: Default + Clone + Copy + Send + Sync + 'static {
    const CODE: &'static str;
    const SYMBOL: &'static str;
    const MINOR_UNIT: &'static str;
    const MINOR_UNITS_PER_MAJOR: i64;
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate
// ─────────────────────────────────────────────────────────────────────────────

/// Default USD to local rate used before any rate has been established.
pub const DEFAULT_LOCAL_PER_USD: f64 = 36.50;

/// A rate value that is not a finite number greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("Invalid exchange rate {0}: must be a finite number greater than zero")]
pub struct InvalidRate(pub f64);

/// Local-currency units per one US dollar.
///
/// Always finite and strictly positive. Deserialization runs the same
/// validation as [`Rate::new`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rate(f64);

impl Rate {
    pub fn new(value: f64) -> Result<Self, InvalidRate> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(InvalidRate(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self(DEFAULT_LOCAL_PER_USD)
    }
}

impl TryFrom<f64> for Rate {
    type Error = InvalidRate;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rate::new(value)
    }
}

impl From<Rate> for f64 {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Type-Safe Money
// ─────────────────────────────────────────────────────────────────────────────

/// An amount in the minor unit of currency `C`.
///
/// Negative amounts are allowed and represent refunds or reversals.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money<C: Currency> {
    amount: i64,
    _currency: PhantomData<C>,
}

impl<C: Currency> Money<C> {
    pub fn from_minor(amount: i64) -> Self {
        Self {
            amount,
            _currency: PhantomData,
        }
    }

    pub fn from_major(major: i64) -> Self {
        Self::from_minor(major.saturating_mul(C::MINOR_UNITS_PER_MAJOR))
    }

    /// Builds an amount from a decimal major-unit value, rounding half away
    /// from zero to the nearest minor unit.
    pub fn from_decimal(value: f64) -> Self {
        Self::from_minor((value * C::MINOR_UNITS_PER_MAJOR as f64).round() as i64)
    }

    pub fn minor_units(&self) -> i64 {
        self.amount
    }
    pub fn major_units(&self) -> i64 {
        self.amount / C::MINOR_UNITS_PER_MAJOR
    }
    pub fn minor_part(&self) -> i64 {
        self.amount.abs() % C::MINOR_UNITS_PER_MAJOR
    }
    pub fn to_decimal(&self) -> f64 {
        self.amount as f64 / C::MINOR_UNITS_PER_MAJOR as f64
    }
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }
    pub fn currency_code(&self) -> &'static str {
        C::CODE
    }
    pub fn currency_symbol(&self) -> &'static str {
        C::SYMBOL
    }

    /// Multiplies a unit price by a quantity.
    pub fn times(self, quantity: i64) -> Self {
        Self::from_minor(self.amount.saturating_mul(quantity))
    }
}

impl<C: Currency> Default for Money<C> {
    fn default() -> Self {
        Self::from_minor(0)
    }
}

impl<C: Currency> fmt::Debug for Money<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Money {{ amount: {}, currency: {} }}",
            self.amount,
            C::CODE
        )
    }
}

impl<C: Currency> fmt::Display for Money<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(
            f,
            "{}{}{}.{:02}",
            sign,
            C::SYMBOL,
            self.major_units().abs(),
            self.minor_part()
        )
    }
}

impl<C: Currency> Add for Money<C> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Money::from_minor(self.amount.saturating_add(rhs.amount))
    }
}

impl<C: Currency> Sub for Money<C> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Money::from_minor(self.amount.saturating_sub(rhs.amount))
    }
}

impl<C: Currency> Neg for Money<C> {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Money::from_minor(self.amount.saturating_neg())
    }
}

impl<C: Currency> Sum for Money<C> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::default(), Add::add)
    }
}

// Serialized as the bare minor-unit integer; the currency is carried by the
// field it sits in.
impl<C: Currency> Serialize for Money<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.amount)
    }
}

impl<'de, C: Currency> Deserialize<'de> for Money<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Money::from_minor)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Currency Conversion Functions
// ─────────────────────────────────────────────────────────────────────────────

fn minor_ratio<F: Currency, T: Currency>() -> f64 {
    T::MINOR_UNITS_PER_MAJOR as f64 / F::MINOR_UNITS_PER_MAJOR as f64
}

/// Converts a USD amount to local currency: `usd * rate`.
pub fn to_local(money: Money<USD>, rate: Rate) -> Money<VES> {
    let local = money.amount as f64 * rate.value() * minor_ratio::<USD, VES>();
    Money::from_minor(local.round() as i64)
}

/// Converts a local-currency amount to USD: `local / rate`.
pub fn to_usd(money: Money<VES>, rate: Rate) -> Money<USD> {
    let usd = money.amount as f64 / rate.value() * minor_ratio::<VES, USD>();
    Money::from_minor(usd.round() as i64)
}

// ─────────────────────────────────────────────────────────────────────────────
// THE MACRO: Defines all currencies, CurrencyCode enum, and runtime dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Macro to define currencies with auto-generated marker types and a runtime
/// `CurrencyCode` enum.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     CurrencyName => ("CODE", "SYMBOL", "minor_unit", minor_per_major),
/// }
/// ```
#[macro_export]
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $symbol:literal, $minor:literal, $minor_per_major:expr)
        ),* $(,)?
    ) => {
        $(
            #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name;

            impl Currency for $name {
                const CODE: &'static str = $code;
                const SYMBOL: &'static str = $symbol;
                const MINOR_UNIT: &'static str = $minor;
                const MINOR_UNITS_PER_MAJOR: i64 = $minor_per_major;
            }
        )*

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum CurrencyCode {
            $($name),*
        }

        impl CurrencyCode {
            pub fn code(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $code),*
                }
            }

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $symbol),*
                }
            }

            pub fn minor_units_per_major(&self) -> i64 {
                match self {
                    $(CurrencyCode::$name => $minor_per_major),*
                }
            }

            pub fn all() -> &'static [CurrencyCode] {
                &[$(CurrencyCode::$name),*]
            }
        }

        impl std::fmt::Display for CurrencyCode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.code())
            }
        }

        impl std::str::FromStr for CurrencyCode {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_uppercase().as_str() {
                    $($code => Ok(CurrencyCode::$name),)*
                    _ => Err(format!("Unknown currency: {}", s)),
                }
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    USD => ("USD", "$", "cent", 100),
    VES => ("VES", "Bs.", "céntimo", 100),
}

/// The local currency prices are quoted against.
pub type Local = VES;

/// Runtime conversion between two currency codes, amounts in minor units.
pub fn convert_dynamic(amount: i64, from: CurrencyCode, to: CurrencyCode, rate: Rate) -> i64 {
    match (from, to) {
        (CurrencyCode::USD, CurrencyCode::VES) => {
            to_local(Money::from_minor(amount), rate).minor_units()
        }
        (CurrencyCode::VES, CurrencyCode::USD) => {
            to_usd(Money::from_minor(amount), rate).minor_units()
        }
        _ => amount,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
