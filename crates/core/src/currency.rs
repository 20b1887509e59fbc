//! Currency resolution and locale-aware formatting.
//!
//! The active currency comes from the persisted settings record, read
//! directly from storage so that callers without a [`crate::SettingsStore`]
//! get the same answer. Formatting always produces exactly two fraction
//! digits and never fails. Any ISO 4217 code is formatted with the locale's
//! conventions; codes without a known symbol show the code itself. Codes
//! outside ISO 4217 or malformed locale tags fall back to
//! `"<CODE> <amount>"`.
//!
//! # Example
//!
//! ```
//! use pos_dashboard_core::format_currency;
//! use rust_decimal::Decimal;
//!
//! let amount = Decimal::new(123_456, 2);
//! assert_eq!(format_currency(amount, Some("USD"), Some("en-US")), "$1,234.56");
//! assert_eq!(format_currency(amount, Some("SEK"), Some("de-DE")), "1.234,56\u{a0}SEK");
//! assert_eq!(format_currency(amount, Some("ZZZ"), None), "ZZZ 1234.56");
//! ```

use std::borrow::Cow;

use iso_currency::Currency;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::settings::read_stored_record;
use crate::storage::KeyValueStore;

/// Currency used when neither an override nor a stored value exists.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Locale used when the caller does not pass one.
pub const DEFAULT_LOCALE: &str = "en-US";

const NBSP: &str = "\u{a0}";
const NARROW_NBSP: &str = "\u{202f}";

/// Display data for a supported currency.
#[derive(Debug, Clone, Copy)]
struct CurrencyInfo {
    code: &'static str,
    /// Symbol shown inside the home regions.
    local_symbol: &'static str,
    /// Symbol shown everywhere else.
    intl_symbol: &'static str,
    home_regions: &'static [&'static str],
}

#[rustfmt::skip]
const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "USD", local_symbol: "$", intl_symbol: "US$", home_regions: &["US"] },
    CurrencyInfo { code: "CAD", local_symbol: "$", intl_symbol: "CA$", home_regions: &["CA"] },
    CurrencyInfo { code: "AUD", local_symbol: "$", intl_symbol: "A$", home_regions: &["AU"] },
    CurrencyInfo { code: "NZD", local_symbol: "$", intl_symbol: "NZ$", home_regions: &["NZ"] },
    CurrencyInfo { code: "MXN", local_symbol: "$", intl_symbol: "MX$", home_regions: &["MX"] },
    CurrencyInfo { code: "EUR", local_symbol: "€", intl_symbol: "€", home_regions: &[] },
    CurrencyInfo { code: "GBP", local_symbol: "£", intl_symbol: "£", home_regions: &[] },
    CurrencyInfo { code: "JPY", local_symbol: "￥", intl_symbol: "¥", home_regions: &["JP"] },
    CurrencyInfo { code: "CNY", local_symbol: "¥", intl_symbol: "CN¥", home_regions: &["CN"] },
    CurrencyInfo { code: "INR", local_symbol: "₹", intl_symbol: "₹", home_regions: &[] },
    CurrencyInfo { code: "BRL", local_symbol: "R$", intl_symbol: "R$", home_regions: &[] },
    CurrencyInfo { code: "CHF", local_symbol: "CHF", intl_symbol: "CHF", home_regions: &[] },
    CurrencyInfo { code: "ZAR", local_symbol: "R", intl_symbol: "ZAR", home_regions: &["ZA"] },
    CurrencyInfo { code: "PHP", local_symbol: "₱", intl_symbol: "₱", home_regions: &[] },
];

/// Where the currency symbol goes relative to the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolPosition {
    /// `$1.00`
    Prefix,
    /// `R$ 1,00`
    PrefixSpaced,
    /// `1,00 €`
    SuffixSpaced,
}

/// Number formatting conventions for a locale.
#[derive(Debug, Clone, Copy)]
struct LocaleConventions {
    language: &'static str,
    region: &'static str,
    decimal: &'static str,
    group: &'static str,
    /// Integer digits required before grouping kicks in is this + 3.
    min_grouping_digits: usize,
    position: SymbolPosition,
}

const EN_US: LocaleConventions = LocaleConventions {
    language: "en",
    region: "US",
    decimal: ".",
    group: ",",
    min_grouping_digits: 1,
    position: SymbolPosition::Prefix,
};

/// First entry per language is that language's default.
#[rustfmt::skip]
const LOCALES: &[LocaleConventions] = &[
    EN_US,
    LocaleConventions { language: "en", region: "GB", decimal: ".", group: ",", min_grouping_digits: 1, position: SymbolPosition::Prefix },
    LocaleConventions { language: "en", region: "CA", decimal: ".", group: ",", min_grouping_digits: 1, position: SymbolPosition::Prefix },
    LocaleConventions { language: "en", region: "AU", decimal: ".", group: ",", min_grouping_digits: 1, position: SymbolPosition::Prefix },
    LocaleConventions { language: "de", region: "DE", decimal: ",", group: ".", min_grouping_digits: 1, position: SymbolPosition::SuffixSpaced },
    LocaleConventions { language: "fr", region: "FR", decimal: ",", group: NARROW_NBSP, min_grouping_digits: 1, position: SymbolPosition::SuffixSpaced },
    LocaleConventions { language: "es", region: "ES", decimal: ",", group: ".", min_grouping_digits: 2, position: SymbolPosition::SuffixSpaced },
    LocaleConventions { language: "es", region: "MX", decimal: ".", group: ",", min_grouping_digits: 1, position: SymbolPosition::Prefix },
    LocaleConventions { language: "it", region: "IT", decimal: ",", group: ".", min_grouping_digits: 1, position: SymbolPosition::SuffixSpaced },
    LocaleConventions { language: "pt", region: "BR", decimal: ",", group: ".", min_grouping_digits: 1, position: SymbolPosition::PrefixSpaced },
    LocaleConventions { language: "ja", region: "JP", decimal: ".", group: ",", min_grouping_digits: 1, position: SymbolPosition::Prefix },
];

/// A parsed BCP 47 language tag (language and optional region only).
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocaleTag {
    language: String,
    region: Option<String>,
}

impl LocaleTag {
    /// Parse a tag such as `en`, `en-US` or `zh-Hant-TW`.
    ///
    /// Returns `None` for malformed tags.
    fn parse(tag: &str) -> Option<Self> {
        let mut subtags = tag.split(['-', '_']);
        let language = subtags.next()?;
        let language_ok =
            (2..=3).contains(&language.len()) && language.chars().all(|c| c.is_ascii_alphabetic());
        if !language_ok {
            return None;
        }

        let mut region = None;
        for subtag in subtags {
            let valid = (1..=8).contains(&subtag.len())
                && subtag.chars().all(|c| c.is_ascii_alphanumeric());
            if !valid {
                return None;
            }
            let is_region = (subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()))
                || (subtag.len() == 3 && subtag.chars().all(|c| c.is_ascii_digit()));
            if is_region && region.is_none() {
                region = Some(subtag.to_ascii_uppercase());
            }
        }

        Some(Self {
            language: language.to_ascii_lowercase(),
            region,
        })
    }

    /// Pick conventions: exact match, then the language default, then `en-US`.
    fn conventions(&self) -> LocaleConventions {
        let exact = self.region.as_deref().and_then(|region| {
            LOCALES
                .iter()
                .find(|l| l.language == self.language && l.region == region)
        });

        exact
            .or_else(|| LOCALES.iter().find(|l| l.language == self.language))
            .copied()
            .unwrap_or(EN_US)
    }
}

/// Symbols used to display one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Symbols {
    local: Cow<'static, str>,
    intl: Cow<'static, str>,
    home_regions: &'static [&'static str],
}

impl Symbols {
    fn for_region(&self, region: &str) -> &str {
        if self.home_regions.contains(&region) {
            &self.local
        } else {
            &self.intl
        }
    }
}

/// Symbols for `code`: the table entry, else the uppercased code for any
/// other ISO 4217 currency. `None` for codes outside ISO 4217.
fn find_currency(code: &str) -> Option<Symbols> {
    if let Some(info) = CURRENCIES.iter().find(|c| c.code.eq_ignore_ascii_case(code)) {
        return Some(Symbols {
            local: Cow::Borrowed(info.local_symbol),
            intl: Cow::Borrowed(info.intl_symbol),
            home_regions: info.home_regions,
        });
    }

    let upper = code.to_ascii_uppercase();
    Currency::from_code(&upper)?;
    Some(Symbols {
        local: Cow::Owned(upper.clone()),
        intl: Cow::Owned(upper),
        home_regions: &[],
    })
}

/// Read the stored currency code, bypassing any in-memory settings.
///
/// Returns [`DEFAULT_CURRENCY`] when nothing is stored, the record is
/// unreadable, or its `currency` field is not a string.
pub fn resolve_currency<S: KeyValueStore + ?Sized>(storage: &S) -> String {
    read_stored_record(storage)
        .and_then(|record| match record.get("currency") {
            Some(serde_json::Value::String(code)) => Some(code.clone()),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned())
}

/// Format `amount` in `currency` (default [`DEFAULT_CURRENCY`]) for
/// `locale` (default [`DEFAULT_LOCALE`]).
///
/// Empty overrides count as absent. Negative amounts keep their sign even
/// when they round to zero. Never fails: a code outside ISO 4217 or a
/// malformed locale produces `"<CODE> <amount to 2 decimals>"`.
#[must_use]
pub fn format_currency(amount: Decimal, currency: Option<&str>, locale: Option<&str>) -> String {
    let code = non_empty(currency).unwrap_or(DEFAULT_CURRENCY);
    let locale = non_empty(locale).unwrap_or(DEFAULT_LOCALE);
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let (Some(symbols), Some(tag)) = (find_currency(code), LocaleTag::parse(locale)) else {
        debug!(currency = code, locale, "Using fallback currency format");
        return format!("{code} {rounded:.2}");
    };

    let negative = amount.is_sign_negative() && !amount.is_zero();
    format_localized(rounded, negative, &symbols, &tag)
}

/// Format using the stored currency unless `currency` overrides it.
#[must_use]
pub fn format_currency_with_store<S: KeyValueStore + ?Sized>(
    storage: &S,
    amount: Decimal,
    currency: Option<&str>,
    locale: Option<&str>,
) -> String {
    match non_empty(currency) {
        Some(code) => format_currency(amount, Some(code), locale),
        None => format_currency(amount, Some(&resolve_currency(storage)), locale),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn format_localized(
    rounded: Decimal,
    negative: bool,
    symbols: &Symbols,
    tag: &LocaleTag,
) -> String {
    let conventions = tag.conventions();
    let region = tag.region.as_deref().unwrap_or(conventions.region);
    let symbol = symbols.for_region(region);

    let number = group_digits(rounded.abs(), &conventions);
    let sign = if negative { "-" } else { "" };

    match conventions.position {
        SymbolPosition::Prefix => {
            let gap = if symbol.ends_with(|c: char| c.is_alphabetic()) {
                NBSP
            } else {
                ""
            };
            format!("{sign}{symbol}{gap}{number}")
        }
        SymbolPosition::PrefixSpaced => format!("{sign}{symbol}{NBSP}{number}"),
        SymbolPosition::SuffixSpaced => format!("{sign}{number}{NBSP}{symbol}"),
    }
}

/// Render a non-negative two-decimal amount with locale separators.
fn group_digits(amount: Decimal, conventions: &LocaleConventions) -> String {
    let plain = format!("{amount:.2}");
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let grouped = if integer.len() >= 3 + conventions.min_grouping_digits {
        let digits: Vec<char> = integer.chars().collect();
        let first = digits.len() % 3;
        let mut out = String::with_capacity(integer.len() * 2);
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 && (i + 3 - first) % 3 == 0 {
                out.push_str(conventions.group);
            }
            out.push(*digit);
        }
        out
    } else {
        integer.to_owned()
    };

    format!("{grouped}{}{fraction}", conventions.decimal)
}
