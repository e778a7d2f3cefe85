use std::sync::LazyLock;

use regex::Regex;

use crate::record::{collapse_whitespace, UNAVAILABLE};

// currency amount, optional range, optional pay period
static SALARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let currency = r"(?:CA?\$|US\$|\bCAD\s?|\bUSD\s?|\$|€|£)";
    let amount = r"(?:\d{1,3}(?:[,\s]\d{3}\b)+|\d+)(?:\.\d+)?(?:\s?k\b)?";
    let pattern = format!(
        r"(?i){currency}\s*{amount}(?:\s*(?:-|–|—|\bto\b)\s*{currency}?\s*{amount})?(?:\s*(?:/|\bper\b|\ban?\b)?\s*(?:hour|hr|year|yr|annum|month|mo|week|wk|day)\b)?"
    );
    Regex::new(&pattern).unwrap_or_else(|err| panic!("salary pattern must compile: {err}"))
});

/// Extract the first currency-prefixed salary substring from noisy text.
///
/// Returns the match verbatim (trimmed) or [`UNAVAILABLE`]. Empty input never
/// reaches the regex.
pub fn normalize_salary(text: Option<&str>) -> String {
    let Some(raw) = text else {
        return UNAVAILABLE.to_string();
    };
    if raw.trim().is_empty() {
        return UNAVAILABLE.to_string();
    }
    let collapsed = collapse_whitespace(raw);
    SALARY_RE
        .find(&collapsed)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_range_with_period() {
        assert_eq!(
            normalize_salary(Some("Pay\n$50,000 - $70,000 a year\nFull-time")),
            "$50,000 - $70,000 a year"
        );
    }

    #[test]
    fn extracts_hourly_rate() {
        assert_eq!(
            normalize_salary(Some("Estimated: $25.50 per hour, benefits")),
            "$25.50 per hour"
        );
        assert_eq!(normalize_salary(Some("$40/hr")), "$40/hr");
    }

    #[test]
    fn extracts_k_suffix_and_canadian_prefix() {
        assert_eq!(
            normalize_salary(Some("Compensation: C$60K–C$80K/yr")),
            "C$60K–C$80K/yr"
        );
    }

    #[test]
    fn unseparated_amount_is_kept_whole() {
        assert_eq!(normalize_salary(Some("$85000 yearly")), "$85000");
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(
            normalize_salary(Some("Bonus $5,000. Salary $90,000 a year")),
            "$5,000"
        );
    }

    #[test]
    fn missing_or_unprefixed_input_gives_sentinel() {
        assert_eq!(normalize_salary(None), UNAVAILABLE);
        assert_eq!(normalize_salary(Some("")), UNAVAILABLE);
        assert_eq!(normalize_salary(Some("   \n ")), UNAVAILABLE);
        assert_eq!(normalize_salary(Some("Salary: 60000 USD")), UNAVAILABLE);
        assert_eq!(normalize_salary(Some("Competitive salary")), UNAVAILABLE);
    }

    #[test]
    fn normalizing_is_idempotent() {
        for input in [
            "Salary $50,000 - $70,000 a year",
            "$25.50 per hour",
            "C$60K–C$80K/yr",
            "from $45 k to $55 k per year!",
            "nothing here",
        ] {
            let once = normalize_salary(Some(input));
            assert_eq!(normalize_salary(Some(&once)), once, "input: {input}");
        }
    }
}
