//! Company name normalization.
//!
//! Raw company names arrive with stray whitespace, underscores, curly
//! apostrophes and trailing noise such as "POS" or "Company". The
//! normalizer reduces them to one canonical display form used for
//! de-duplication.

use std::sync::LazyLock;

use regex::Regex;

/// Apostrophe look-alikes folded into `'`.
const APOSTROPHE_VARIANTS: &[char] = &[
    '\u{2018}', // left single quotation mark
    '\u{2019}', // right single quotation mark
    '\u{201B}', // single high-reversed-9 quotation mark
    '\u{2032}', // prime
    '\u{0060}', // grave accent
    '\u{00B4}', // acute accent
    '\u{02BC}', // modifier letter apostrophe
    '\u{FF07}', // fullwidth apostrophe
];

static SEPARATOR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_.]+").expect("Invalid regex"));

static POS_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:(?:^|\s+)pos)?(?:'s)?$").expect("Invalid regex"));

static COMPANY_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s+)company$").expect("Invalid regex"));

static POSSESSIVE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:'|\x{2019})s$").expect("Invalid regex"));

/// Normalize a raw company name into its canonical display form.
///
/// Total and deterministic: `None`, empty and whitespace-only input give an
/// empty string, and the result is a fixed point
/// (`normalize(normalize(s)) == normalize(s)`).
///
/// # Examples
///
/// ```
/// use pos_dashboard_core::normalize_company_name;
///
/// assert_eq!(normalize_company_name(Some("Acme Pos's Company")), "Acme");
/// assert_eq!(normalize_company_name(Some("  best_buy.shop  ")), "Best Buy Shop");
/// assert_eq!(normalize_company_name(None), "");
/// ```
#[must_use]
pub fn normalize_company_name(input: Option<&str>) -> String {
    let Some(raw) = input else {
        return String::new();
    };

    // Title-casing can emit characters the earlier steps rewrite ('ŉ'
    // uppercases to "ʼN"), so run whole passes until the output is stable.
    let mut current = normalize_pass(raw);
    for _ in 0..MAX_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Upper bound on whole-pipeline passes. Real names settle in two.
const MAX_PASSES: usize = 8;

/// One run of every normalization step.
fn normalize_pass(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let apostrophes: String = trimmed
        .chars()
        .map(|c| if APOSTROPHE_VARIANTS.contains(&c) { '\'' } else { c })
        .collect();
    let separated = SEPARATOR_RUN_RE.replace_all(&apostrophes, " ");

    // The suffix passes only look at the very end, so stripping one can
    // expose another ("Acme Pos's Company"). Repeat until nothing changes.
    let mut current = collapse_whitespace(&separated);
    loop {
        let stripped = strip_suffixes(&current);
        if stripped == current {
            break;
        }
        current = stripped;
    }

    title_case(&current)
}

/// Lowercase-trimmed key used to group exact duplicate names.
#[must_use]
pub fn company_dedup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One pass of the suffix rules, in their fixed order.
fn strip_suffixes(name: &str) -> String {
    let without_pos = POS_SUFFIX_RE.replace(name, "");
    let without_company = COMPANY_SUFFIX_RE.replace(&without_pos, "");
    let without_possessive = POSSESSIVE_SUFFIX_RE.replace(&without_company, "");
    collapse_whitespace(&without_possessive)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercase the first character of each space-separated token.
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|token| {
            let mut chars = token.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
