//! Money handling: integer minor-unit amounts and locale-aware rendering.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
};

use serde::{Deserialize, Serialize};

use crate::errors::BillingError;

const MINOR_PER_MAJOR: i64 = 100;
const MINOR_DIGITS: u8 = 2;

/// A currency value stored as an integer count of minor units (paise).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn from_major(major: i64) -> Self {
        Self(major.saturating_mul(MINOR_PER_MAJOR))
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Divides by `divisor`, rounding half away from zero. Dividing by zero yields zero.
    pub fn div_round(self, divisor: u64) -> Amount {
        if divisor == 0 {
            return Amount::ZERO;
        }
        let divisor = i128::from(divisor);
        let value = i128::from(self.0);
        let half = divisor / 2;
        let rounded = if value >= 0 {
            (value + half) / divisor
        } else {
            (value - half) / divisor
        };
        Amount(rounded as i64)
    }

    /// Parses user input such as `1250`, `1,250.5`, or `₹1,250.50`.
    pub fn parse(input: &str) -> Result<Amount, BillingError> {
        let invalid = || BillingError::InvalidInput(format!("invalid amount `{}`", input));
        let cleaned: String = input
            .trim()
            .trim_start_matches('₹')
            .chars()
            .filter(|c| *c != ',' && *c != '_')
            .collect();
        if cleaned.starts_with('-') {
            return Err(BillingError::InvalidInput(format!(
                "amount `{}` must not be negative",
                input
            )));
        }
        let (whole, fraction) = match cleaned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (cleaned.as_str(), ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || fraction.len() > MINOR_DIGITS as usize
        {
            return Err(invalid());
        }
        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut minor: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid())?
        };
        if fraction.len() == 1 {
            minor *= 10;
        }
        major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|value| value.checked_add(minor))
            .map(Amount)
            .ok_or_else(invalid)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR as u64;
        write!(f, "{}{}.{:02}", sign, abs / per, abs % per)
    }
}

/// How digits of the integer part are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grouping {
    /// Last three digits, then pairs: `12,34,567`.
    Indian,
    /// Groups of three: `1,234,567`.
    Western,
}

impl Grouping {
    pub fn for_locale(language_tag: &str) -> Self {
        if language_tag.eq_ignore_ascii_case("en-IN") || language_tag.ends_with("-IN") {
            Grouping::Indian
        } else {
            Grouping::Western
        }
    }
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "INR" => "₹".into(),
        "USD" => "$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        _ => format!("{} ", code),
    }
}

/// Formats presentation strings for amounts.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: Amount) -> String;
}

/// Formatter mirroring `Intl.NumberFormat('en-IN', { style: 'currency', currency: 'INR' })`
/// with a configurable number of fraction digits.
#[derive(Debug, Clone)]
pub struct InrFormatter {
    pub symbol: String,
    pub fraction_digits: u8,
    pub grouping: Grouping,
}

impl Default for InrFormatter {
    fn default() -> Self {
        Self {
            symbol: symbol_for("INR"),
            fraction_digits: 0,
            grouping: Grouping::Indian,
        }
    }
}

impl InrFormatter {
    pub fn new(currency: &str, locale: &str, fraction_digits: u8) -> Self {
        Self {
            symbol: symbol_for(currency),
            fraction_digits: fraction_digits.min(MINOR_DIGITS),
            grouping: Grouping::for_locale(locale),
        }
    }
}

impl CurrencyFormatter for InrFormatter {
    fn format_amount(&self, amount: Amount) -> String {
        let body = format_number(amount, self.fraction_digits, self.grouping);
        match body.strip_prefix('-') {
            Some(rest) => format!("-{}{}", self.symbol, rest),
            None => format!("{}{}", self.symbol, body),
        }
    }
}

/// Shorthand for the default `en-IN` rupee rendering with no fraction digits.
pub fn format_inr(amount: Amount) -> String {
    InrFormatter::default().format_amount(amount)
}

/// Renders `amount` in major units, rounded half-up to `fraction_digits`.
pub fn format_number(amount: Amount, fraction_digits: u8, grouping: Grouping) -> String {
    let digits = fraction_digits.min(MINOR_DIGITS);
    let scale = 10_i64.pow(u32::from(MINOR_DIGITS - digits)) as u64;
    let abs = amount.minor().unsigned_abs();
    let rounded = (abs + scale / 2) / scale;
    let unit = 10_u64.pow(u32::from(digits));
    let whole = rounded / unit;
    let fraction = rounded % unit;

    let mut body = group_digits(&whole.to_string(), grouping);
    if digits > 0 {
        body.push('.');
        body.push_str(&format!("{:0width$}", fraction, width = digits as usize));
    }
    if amount.is_negative() && rounded != 0 {
        format!("-{}", body)
    } else {
        body
    }
}

fn group_digits(digits: &str, grouping: Grouping) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let step = match grouping {
        Grouping::Indian => 2,
        Grouping::Western => 3,
    };
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}
