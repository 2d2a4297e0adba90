//! Locale-aware number formatting
//!
//! The embedded engine ships without an `Intl` implementation, so the bridge
//! formats numbers for `toLocaleString` itself. Coverage is deliberately
//! compact: structural BCP-47 validation, separator/grouping conventions for
//! the common locales, currency symbols and fraction digits for the common
//! ISO 4217 codes, and the `decimal`, `percent` and `currency` styles.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

const NBSP: &str = "\u{a0}";
const NNBSP: &str = "\u{202f}";

/// Errors raised while resolving a locale or formatting options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("invalid language tag: {0}")]
    InvalidLanguageTag(String),

    #[error("invalid currency code in NumberFormat(): {0}")]
    InvalidCurrency(String),

    #[error("Currency code is required with currency style.")]
    MissingCurrency,

    #[error("invalid value \"{value}\" for option {option}")]
    InvalidOption { option: &'static str, value: String },

    #[error("{option} value is out of range.")]
    DigitsOutOfRange { option: &'static str },
}

impl LocaleError {
    /// Whether the script-visible error is a `RangeError` (otherwise `TypeError`).
    pub fn is_range_error(&self) -> bool {
        !matches!(self, LocaleError::MissingCurrency)
    }
}

// ============================================================================
// LANGUAGE TAGS
// ============================================================================

/// A structurally valid BCP-47 language tag, stored in canonical case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTag {
    language: String,
    script: Option<String>,
    region: Option<String>,
    tail: Vec<String>,
}

impl LanguageTag {
    /// Parse and canonicalize a tag such as `ja-JP` or `zh-Hant-TW`.
    pub fn parse(tag: &str) -> Result<Self, LocaleError> {
        let invalid = || LocaleError::InvalidLanguageTag(tag.to_string());

        let subtags: Vec<&str> = tag.split('-').collect();
        if subtags
            .iter()
            .any(|s| s.is_empty() || s.len() > 8 || !s.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(invalid());
        }

        let mut rest = subtags.iter().copied().peekable();
        let language = match rest.next() {
            Some(s) if is_alpha(s) && matches!(s.len(), 2 | 3 | 5..=8) => s.to_ascii_lowercase(),
            _ => return Err(invalid()),
        };

        let mut script = None;
        let mut region = None;
        let mut tail = Vec::new();

        if let Some(s) = rest.peek().copied() {
            if s.len() == 4 && is_alpha(s) {
                let mut chars = s.chars();
                let first = chars.next().map(|c| c.to_ascii_uppercase());
                script = Some(first.into_iter().chain(chars.map(|c| c.to_ascii_lowercase())).collect());
                rest.next();
            }
        }

        if let Some(s) = rest.peek().copied() {
            if (s.len() == 2 && is_alpha(s)) || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit())) {
                region = Some(s.to_ascii_uppercase());
                rest.next();
            }
        }

        // variants
        while let Some(s) = rest.peek().copied() {
            let is_variant = (5..=8).contains(&s.len())
                || (s.len() == 4 && s.starts_with(|c: char| c.is_ascii_digit()));
            if !is_variant {
                break;
            }
            let variant = s.to_ascii_lowercase();
            if tail.contains(&variant) {
                return Err(invalid());
            }
            tail.push(variant);
            rest.next();
        }

        // extensions and private use
        while let Some(singleton) = rest.next() {
            if singleton.len() != 1 {
                return Err(invalid());
            }
            let private_use = singleton.eq_ignore_ascii_case("x");
            let min_len = if private_use { 1 } else { 2 };
            let mut count = 0;
            tail.push(singleton.to_ascii_lowercase());
            while let Some(s) = rest.peek().copied() {
                if s.len() == 1 && !private_use {
                    break;
                }
                if s.len() < min_len {
                    return Err(invalid());
                }
                tail.push(s.to_ascii_lowercase());
                count += 1;
                rest.next();
            }
            if count == 0 {
                return Err(invalid());
            }
        }

        Ok(Self { language, script, region, tail })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        for part in self.script.iter().chain(self.region.iter()).chain(self.tail.iter()) {
            write!(f, "-{part}")?;
        }
        Ok(())
    }
}

fn is_alpha(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphabetic())
}

// ============================================================================
// LOCALE DATA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    /// Groups of three: 1,234,567
    Standard,
    /// Three, then twos: 12,34,567
    Indian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CurrencyPlacement {
    /// `$12.00`
    Prefix,
    /// `€ 12,00`
    PrefixSpaced,
    /// `12,00 €`
    Suffix,
}

#[derive(Debug, Clone, Copy)]
struct LocaleSymbols {
    decimal: &'static str,
    group: &'static str,
    grouping: Grouping,
    /// Minimum integer digits before grouping kicks in (es: 8123, 12.345).
    min_grouping_digits: usize,
    currency: CurrencyPlacement,
    percent_separator: &'static str,
}

const fn symbols(
    decimal: &'static str,
    group: &'static str,
    currency: CurrencyPlacement,
    percent_separator: &'static str,
) -> LocaleSymbols {
    LocaleSymbols {
        decimal,
        group,
        grouping: Grouping::Standard,
        min_grouping_digits: 4,
        currency,
        percent_separator,
    }
}

const ENGLISH: LocaleSymbols = symbols(".", ",", CurrencyPlacement::Prefix, "");

static LOCALE_SYMBOLS: Lazy<HashMap<&'static str, LocaleSymbols>> = Lazy::new(|| {
    use CurrencyPlacement::*;

    let mut table = HashMap::new();
    for lang in ["en", "ja", "zh", "ko", "th", "he", "ms", "fil"] {
        table.insert(lang, ENGLISH);
    }
    for lang in ["en-IN", "hi", "bn"] {
        table.insert(lang, LocaleSymbols { grouping: Grouping::Indian, ..ENGLISH });
    }
    for lang in ["de", "it", "da", "el"] {
        table.insert(lang, symbols(",", ".", Suffix, NBSP));
    }
    table.insert("de-AT", symbols(",", NBSP, PrefixSpaced, NBSP));
    table.insert("de-CH", symbols(".", "’", PrefixSpaced, ""));
    table.insert("de-LI", symbols(".", "’", PrefixSpaced, ""));
    table.insert("nl", symbols(",", ".", PrefixSpaced, ""));
    table.insert("id", symbols(",", ".", Prefix, ""));
    table.insert("tr", symbols(",", ".", Prefix, ""));
    table.insert("pt", symbols(",", ".", PrefixSpaced, ""));
    table.insert("pt-PT", symbols(",", NBSP, Suffix, ""));
    table.insert(
        "es",
        LocaleSymbols { min_grouping_digits: 5, ..symbols(",", ".", Suffix, NBSP) },
    );
    table.insert("es-MX", symbols(".", ",", Prefix, ""));
    table.insert("es-US", symbols(".", ",", Prefix, NBSP));
    table.insert("fr", symbols(",", NNBSP, Suffix, NNBSP));
    table.insert("fr-CH", symbols(",", NNBSP, Suffix, ""));
    for lang in ["ru", "uk", "cs", "sk", "sv", "nb", "no", "fi", "bg"] {
        table.insert(lang, symbols(",", NBSP, Suffix, NBSP));
    }
    table.insert(
        "pl",
        LocaleSymbols { min_grouping_digits: 5, ..symbols(",", NBSP, Suffix, "") },
    );
    table
});

fn symbols_for(tag: &LanguageTag) -> LocaleSymbols {
    if let Some(region) = tag.region() {
        let key = format!("{}-{}", tag.language(), region);
        if let Some(found) = LOCALE_SYMBOLS.get(key.as_str()) {
            return *found;
        }
    }
    match LOCALE_SYMBOLS.get(tag.language()) {
        Some(found) => *found,
        None => {
            tracing::trace!(locale = %tag, "no locale data, using English conventions");
            ENGLISH
        }
    }
}

fn currency_digits(code: &str) -> usize {
    match code {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" | "PYG" | "XAF" | "XOF" => 0,
        "BHD" | "KWD" | "JOD" | "OMR" | "TND" | "IQD" | "LYD" => 3,
        _ => 2,
    }
}

fn currency_symbol(code: &str, tag: &LanguageTag) -> String {
    let lang = tag.language();
    let region = tag.region().unwrap_or("");
    let symbol = match code {
        "USD" if lang == "en" && matches!(region, "CA" | "AU" | "NZ" | "SG" | "HK") => "US$",
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" if lang == "ja" => "￥",
        "JPY" => "¥",
        "CNY" if lang == "zh" => "¥",
        "CNY" => "CN¥",
        "KRW" => "₩",
        "INR" => "₹",
        "CAD" if region == "CA" => "$",
        "CAD" => "CA$",
        "AUD" if region == "AU" => "$",
        "AUD" => "A$",
        "MXN" if region == "MX" => "$",
        "MXN" => "MX$",
        "NZD" if region == "NZ" => "$",
        "NZD" => "NZ$",
        "HKD" => "HK$",
        "TWD" => "NT$",
        "BRL" => "R$",
        "RUB" if lang == "ru" => "₽",
        "TRY" if lang == "tr" => "₺",
        "ILS" => "₪",
        "VND" => "₫",
        "PHP" => "₱",
        other => other,
    };
    symbol.to_string()
}

fn narrow_symbol(symbol: &str) -> String {
    // "US$" -> "$", "CA$" -> "$"; alphabetic codes stay as they are
    match symbol.char_indices().find(|(_, c)| !c.is_ascii_alphabetic()) {
        Some((index, _)) if index > 0 => symbol[index..].to_string(),
        _ => symbol.to_string(),
    }
}

// ============================================================================
// NUMBER FORMAT
// ============================================================================

/// Raw formatting options as read from a script options object.
///
/// Values stay unvalidated here; [`NumberFormat::new`] resolves them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberFormatOptions {
    pub style: Option<String>,
    pub currency: Option<String>,
    pub currency_display: Option<String>,
    pub minimum_fraction_digits: Option<f64>,
    pub maximum_fraction_digits: Option<f64>,
    pub use_grouping: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
enum Style {
    Decimal,
    Percent,
    Currency { symbol: String },
}

/// A resolved number formatter for one locale and option set.
#[derive(Debug, Clone)]
pub struct NumberFormat {
    locale: LanguageTag,
    symbols: LocaleSymbols,
    style: Style,
    minimum_fraction_digits: usize,
    maximum_fraction_digits: usize,
    use_grouping: bool,
}

impl NumberFormat {
    pub fn new(locale: &str, options: &NumberFormatOptions) -> Result<Self, LocaleError> {
        let tag = LanguageTag::parse(locale)?;
        let symbols = symbols_for(&tag);

        let currency = match &options.currency {
            Some(code) => {
                if code.len() != 3 || !is_alpha(code) {
                    return Err(LocaleError::InvalidCurrency(code.clone()));
                }
                Some(code.to_ascii_uppercase())
            }
            None => None,
        };

        let (style, default_min, default_max) = match options.style.as_deref().unwrap_or("decimal") {
            "decimal" => (Style::Decimal, 0, 3),
            "percent" => (Style::Percent, 0, 0),
            "currency" => {
                let code = currency.ok_or(LocaleError::MissingCurrency)?;
                let digits = currency_digits(&code);
                let symbol = match options.currency_display.as_deref().unwrap_or("symbol") {
                    "symbol" => currency_symbol(&code, &tag),
                    "narrowSymbol" => narrow_symbol(&currency_symbol(&code, &tag)),
                    "code" => code.clone(),
                    other => {
                        return Err(LocaleError::InvalidOption {
                            option: "currencyDisplay",
                            value: other.to_string(),
                        })
                    }
                };
                (Style::Currency { symbol }, digits, digits)
            }
            other => {
                return Err(LocaleError::InvalidOption { option: "style", value: other.to_string() })
            }
        };

        let min = digits_option(options.minimum_fraction_digits, "minimumFractionDigits")?;
        let max = digits_option(options.maximum_fraction_digits, "maximumFractionDigits")?;
        let (minimum_fraction_digits, maximum_fraction_digits) = match (min, max) {
            (None, None) => (default_min, default_max),
            (Some(min), None) => (min, default_max.max(min)),
            (None, Some(max)) => (default_min.min(max), max),
            (Some(min), Some(max)) if min > max => {
                return Err(LocaleError::DigitsOutOfRange { option: "maximumFractionDigits" })
            }
            (Some(min), Some(max)) => (min, max),
        };

        Ok(Self {
            locale: tag,
            symbols,
            style,
            minimum_fraction_digits,
            maximum_fraction_digits,
            use_grouping: options.use_grouping.unwrap_or(true),
        })
    }

    pub fn locale(&self) -> &LanguageTag {
        &self.locale
    }

    /// Format one number.
    pub fn format(&self, value: f64) -> String {
        let negative = value < 0.0 || (value == 0.0 && value.is_sign_negative());
        let scaled = match self.style {
            Style::Percent => value.abs() * 100.0,
            _ => value.abs(),
        };

        let digits = if scaled.is_nan() {
            "NaN".to_string()
        } else if scaled.is_infinite() {
            "∞".to_string()
        } else {
            self.format_finite(scaled)
        };
        let sign = if negative && !value.is_nan() { "-" } else { "" };

        match &self.style {
            Style::Decimal => format!("{sign}{digits}"),
            Style::Percent => format!("{sign}{digits}{}%", self.symbols.percent_separator),
            Style::Currency { symbol } => match self.symbols.currency {
                CurrencyPlacement::Prefix if symbol.ends_with(|c: char| c.is_ascii_alphabetic()) => {
                    format!("{sign}{symbol}{NBSP}{digits}")
                }
                CurrencyPlacement::Prefix => format!("{sign}{symbol}{digits}"),
                CurrencyPlacement::PrefixSpaced => format!("{sign}{symbol}{NBSP}{digits}"),
                CurrencyPlacement::Suffix => format!("{sign}{digits}{NBSP}{symbol}"),
            },
        }
    }

    fn format_finite(&self, abs: f64) -> String {
        let fixed = format!("{:.*}", self.maximum_fraction_digits, abs);
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

        let mut fraction = frac_part.to_string();
        while fraction.len() > self.minimum_fraction_digits && fraction.ends_with('0') {
            fraction.pop();
        }

        let integer = if self.use_grouping {
            group_digits(int_part, &self.symbols)
        } else {
            int_part.to_string()
        };

        if fraction.is_empty() {
            integer
        } else {
            format!("{integer}{}{fraction}", self.symbols.decimal)
        }
    }
}

fn digits_option(value: Option<f64>, option: &'static str) -> Result<Option<usize>, LocaleError> {
    match value {
        None => Ok(None),
        Some(v) if v.is_finite() && (0.0..=100.0).contains(&v.trunc()) => Ok(Some(v.trunc() as usize)),
        Some(_) => Err(LocaleError::DigitsOutOfRange { option }),
    }
}

fn group_digits(digits: &str, symbols: &LocaleSymbols) -> String {
    if digits.len() < symbols.min_grouping_digits {
        return digits.to_string();
    }

    let mut groups: Vec<&str> = Vec::new();
    let mut end = digits.len();
    let mut size = 3;
    while end > size {
        groups.push(&digits[end - size..end]);
        end -= size;
        if symbols.grouping == Grouping::Indian {
            size = 2;
        }
    }
    groups.push(&digits[..end]);
    groups.reverse();
    groups.join(symbols.group)
}
