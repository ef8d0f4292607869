//! Case description parser
//!
//! Turns vendor shorthand such as "36/1#", "120 count, 50#" or "6 x 102 oz"
//! into a case quantity and unit. Patterns are tried in a fixed order and the
//! first one that yields a positive quantity wins. Several patterns are
//! substrings of later ones ("36/1#" contains "1#"), so the order matters.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};

use super::units::CaseUnit;

/// A quantity: "1,000", "2.5", ".5" or "12"
const NUM: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)";

lazy_static! {
    /// "120 count, 50#", "24 heads 30 lbs"
    static ref DUAL_UNIT: Regex = Regex::new(&format!(
        r"(?i){n}\s*(count|pieces?|heads?|each|ea|items?)\b\s*[,\s]\s*{n}\s*(#|(?:pounds?|lbs?)\b)",
        n = NUM
    )).unwrap();

    /// "36/1#"
    static ref SLASH_POUND: Regex = Regex::new(&format!(
        r"(?i){n}\s*/\s*{n}\s*#",
        n = NUM
    )).unwrap();

    /// "1/25LB", "36/1 lb"
    static ref SLASH_LB: Regex = Regex::new(&format!(
        r"(?i){n}\s*/\s*{n}\s*(pounds?|lbs?)\b",
        n = NUM
    )).unwrap();

    /// "25#"
    static ref SIMPLE_POUND: Regex = Regex::new(&format!(r"(?i){n}\s*#", n = NUM)).unwrap();

    /// "24 heads", "12 bunches", "100 ea"
    static ref COUNT: Regex = Regex::new(&format!(
        r"(?i){n}\s*(count|heads?|bunch(?:es)?|pieces?|each|ea|items?)\b",
        n = NUM
    )).unwrap();

    /// "6 x 102 oz"
    static ref MULTIPLY: Regex = Regex::new(&format!(
        r"(?i){n}\s*[x×]\s*{n}\s*(oz|lbs?|kg|g|ml|l)\b",
        n = NUM
    )).unwrap();

    /// "50 lb", "5 kg", "16 ounces"
    ///
    /// Group 1 captures a leading "N/" or "N x"; such a match is the tail of
    /// a slash or multiply description and is not a weight.
    static ref WEIGHT: Regex = Regex::new(&format!(
        r"(?i)({n}\s*[/x×]\s*)?{n}\s*(pounds?|lbs?|kilograms?|kgs?|ounces?|oz|grams?|g)\b",
        n = NUM
    )).unwrap();

    /// "4 gal", "32 fl oz", "1.5 liters"
    static ref VOLUME: Regex = Regex::new(&format!(
        r"(?i){n}\s*(gallons?|gal|quarts?|qt|pints?|pt|cups?|fl\.?\s*oz|fluid\s+ounces?|liters?|litres?|ml|l)\b",
        n = NUM
    )).unwrap();

    static ref NUMBER_ONLY: Regex = Regex::new(NUM).unwrap();
}

/// Formats listed back to the user when nothing matches
pub const ACCEPTED_FORMATS: &str =
    r#""25#", "36/1#", "1/25 lb", "120 count, 50#", "24 heads", "6 x 102 oz", "50 lb", "4 gal""#;

/// Rule that produced a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePattern {
    DualUnit,
    SlashPound,
    SlashLb,
    SimplePound,
    Count,
    Multiply,
    Weight,
    Volume,
    NumberOnly,
}

impl CasePattern {
    /// Evaluation order; earlier entries shadow later ones
    pub const CASCADE: [CasePattern; 9] = [
        CasePattern::DualUnit,
        CasePattern::SlashPound,
        CasePattern::SlashLb,
        CasePattern::SimplePound,
        CasePattern::Count,
        CasePattern::Multiply,
        CasePattern::Weight,
        CasePattern::Volume,
        CasePattern::NumberOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CasePattern::DualUnit => "dual_unit",
            CasePattern::SlashPound => "slash_pound",
            CasePattern::SlashLb => "slash_lb",
            CasePattern::SimplePound => "simple_pound",
            CasePattern::Count => "count",
            CasePattern::Multiply => "multiply",
            CasePattern::Weight => "weight",
            CasePattern::Volume => "volume",
            CasePattern::NumberOnly => "number_only",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        Self::CASCADE.into_iter().find(|p| p.as_str() == s)
    }

    fn regex(&self) -> &'static Regex {
        match self {
            CasePattern::DualUnit => &DUAL_UNIT,
            CasePattern::SlashPound => &SLASH_POUND,
            CasePattern::SlashLb => &SLASH_LB,
            CasePattern::SimplePound => &SIMPLE_POUND,
            CasePattern::Count => &COUNT,
            CasePattern::Multiply => &MULTIPLY,
            CasePattern::Weight => &WEIGHT,
            CasePattern::Volume => &VOLUME,
            CasePattern::NumberOnly => &NUMBER_ONLY,
        }
    }

    /// First occurrence in `text` this rule can turn into a case
    fn try_match(&self, text: &str) -> Option<ParsedCase> {
        self.regex()
            .captures_iter(text)
            .find_map(|caps| self.build(&caps))
    }

    fn build(&self, caps: &Captures) -> Option<ParsedCase> {
        let raw = caps.get(0)?.as_str();

        match self {
            CasePattern::DualUnit => {
                let count = quantity(caps, 1)?;
                let weight = quantity(caps, 3)?;
                Some(ParsedCase {
                    is_dual_unit: true,
                    secondary_quantity: Some(weight),
                    secondary_unit: Some(CaseUnit::Lbs),
                    ..ParsedCase::single(count, CaseUnit::Each, *self, raw)
                })
            }
            CasePattern::SlashPound => {
                let packs = quantity(caps, 1)?;
                number(caps, 2)?;
                Some(ParsedCase::single(packs, CaseUnit::Lbs, *self, raw))
            }
            CasePattern::SlashLb => {
                let n = quantity(caps, 1)?;
                let m = quantity(caps, 2)?;
                Some(ParsedCase::single(n.max(m), CaseUnit::Lbs, *self, raw))
            }
            CasePattern::SimplePound => {
                let pounds = quantity(caps, 1)?;
                Some(ParsedCase::single(pounds, CaseUnit::Lbs, *self, raw))
            }
            CasePattern::Count => {
                let n = quantity(caps, 1)?;
                let unit = CaseUnit::from_token(caps.get(2)?.as_str()).unwrap_or(CaseUnit::Each);
                Some(ParsedCase::single(n, unit, *self, raw))
            }
            CasePattern::Multiply => {
                // Outer multiplier only; the per-item size is not folded in
                let n = quantity(caps, 1)?;
                number(caps, 2)?;
                let unit = CaseUnit::from_token(caps.get(3)?.as_str())?;
                Some(ParsedCase::single(n, unit, *self, raw))
            }
            CasePattern::Weight => {
                if caps.get(1).is_some() {
                    return None;
                }
                let n = quantity(caps, 3)?;
                let unit = CaseUnit::from_token(caps.get(4)?.as_str())?;
                Some(ParsedCase::single(n, unit, *self, raw))
            }
            CasePattern::Volume => {
                let n = quantity(caps, 1)?;
                let unit = CaseUnit::from_token(caps.get(2)?.as_str())?;
                Some(ParsedCase::single(n, unit, *self, raw))
            }
            CasePattern::NumberOnly => {
                let n = quantity(caps, 1)?;
                let mut parsed = ParsedCase::single(n, CaseUnit::Each, *self, raw);
                parsed.warning = Some(format!(
                    "No unit recognized in '{}'; assumed {} {}",
                    caps.get(0)?.as_str(),
                    n,
                    CaseUnit::Each
                ));
                Some(parsed)
            }
        }
    }
}

fn number(caps: &Captures, group: usize) -> Option<f64> {
    let value: f64 = caps.get(group)?.as_str().replace(',', "").parse().ok()?;
    value.is_finite().then_some(value)
}

/// A captured number usable as a case quantity
fn quantity(caps: &Captures, group: usize) -> Option<f64> {
    number(caps, group).filter(|v| *v > 0.0)
}

/// A successfully parsed case description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCase {
    /// Always greater than zero
    pub case_quantity: f64,
    pub case_unit: CaseUnit,
    pub pattern: CasePattern,
    pub raw_match: String,
    pub is_dual_unit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_unit: Option<CaseUnit>,
    /// Set when the unit was guessed rather than read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ParsedCase {
    fn single(quantity: f64, unit: CaseUnit, pattern: CasePattern, raw: &str) -> Self {
        Self {
            case_quantity: quantity,
            case_unit: unit,
            pattern,
            raw_match: raw.to_string(),
            is_dual_unit: false,
            secondary_quantity: None,
            secondary_unit: None,
            warning: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseFailure {
    pub error: String,
}

/// Outcome of parsing a case description
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    Success(ParsedCase),
    Failure(ParseFailure),
}

impl ParseResult {
    fn failure(error: String) -> Self {
        ParseResult::Failure(ParseFailure { error })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success(_))
    }

    pub fn parsed(&self) -> Option<&ParsedCase> {
        match self {
            ParseResult::Success(case) => Some(case),
            ParseResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ParseResult::Success(_) => None,
            ParseResult::Failure(f) => Some(&f.error),
        }
    }

    pub fn warning(&self) -> Option<&str> {
        self.parsed().and_then(|c| c.warning.as_deref())
    }
}

#[derive(Serialize)]
struct SuccessBody<'a> {
    success: bool,
    #[serde(flatten)]
    case: &'a ParsedCase,
}

#[derive(Serialize)]
struct FailureBody<'a> {
    success: bool,
    error: &'a str,
}

impl Serialize for ParseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParseResult::Success(case) => SuccessBody { success: true, case }.serialize(serializer),
            ParseResult::Failure(f) => FailureBody {
                success: false,
                error: &f.error,
            }
            .serialize(serializer),
        }
    }
}

/// Parse a free-text case description
///
/// Never fails loudly: an unrecognizable description comes back as
/// `ParseResult::Failure` with a message listing accepted formats.
pub fn parse_case_description(description: &str) -> ParseResult {
    let text = description.trim();

    if text.is_empty() {
        return ParseResult::failure(format!(
            "Case description is empty. Try a format like {}",
            ACCEPTED_FORMATS
        ));
    }

    for pattern in CasePattern::CASCADE {
        if let Some(parsed) = pattern.try_match(text) {
            tracing::debug!(
                "Parsed case '{}' via {}: {} {}",
                text,
                pattern.as_str(),
                parsed.case_quantity,
                parsed.case_unit
            );
            if let Some(warning) = &parsed.warning {
                tracing::warn!("{}", warning);
            }
            return ParseResult::Success(parsed);
        }
    }

    ParseResult::failure(format!(
        "Could not parse case description '{}'. Try a format like {}",
        text, ACCEPTED_FORMATS
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> ParsedCase {
        match parse_case_description(text) {
            ParseResult::Success(case) => case,
            ParseResult::Failure(f) => panic!("expected '{}' to parse: {}", text, f.error),
        }
    }

    #[test]
    fn test_simple_pound() {
        for (text, qty) in [("25#", 25.0), ("50 #", 50.0), ("  2.5# ", 2.5)] {
            let case = parse_ok(text);
            assert_eq!(case.pattern, CasePattern::SimplePound);
            assert_eq!(case.case_unit, CaseUnit::Lbs);
            assert_eq!(case.case_quantity, qty);
        }
    }

    #[test]
    fn test_slash_pound_takes_first_number() {
        let case = parse_ok("36/1#");
        assert_eq!(case.pattern, CasePattern::SlashPound);
        assert_eq!(case.case_quantity, 36.0);
        assert_eq!(case.case_unit, CaseUnit::Lbs);
        assert_eq!(case.raw_match, "36/1#");

        let case = parse_ok("4/5#");
        assert_eq!(case.case_quantity, 4.0);
    }

    #[test]
    fn test_slash_lb_takes_larger_number() {
        let case = parse_ok("1/25LB");
        assert_eq!(case.pattern, CasePattern::SlashLb);
        assert_eq!(case.case_quantity, 25.0);
        assert_eq!(case.case_unit, CaseUnit::Lbs);

        let case = parse_ok("36/1 lb");
        assert_eq!(case.case_quantity, 36.0);

        let case = parse_ok("2/10 pounds");
        assert_eq!(case.case_quantity, 10.0);
    }

    #[test]
    fn test_dual_unit() {
        let case = parse_ok("120 count, 50#");
        assert_eq!(case.pattern, CasePattern::DualUnit);
        assert!(case.is_dual_unit);
        assert_eq!(case.case_quantity, 120.0);
        assert_eq!(case.case_unit, CaseUnit::Each);
        assert_eq!(case.secondary_quantity, Some(50.0));
        assert_eq!(case.secondary_unit, Some(CaseUnit::Lbs));

        let case = parse_ok("24 heads 30 lbs");
        assert!(case.is_dual_unit);
        assert_eq!(case.case_quantity, 24.0);
        assert_eq!(case.case_unit, CaseUnit::Each);
        assert_eq!(case.secondary_quantity, Some(30.0));

        let case = parse_ok("90 EA, 40 Pounds");
        assert_eq!(case.case_quantity, 90.0);
        assert_eq!(case.secondary_quantity, Some(40.0));
    }

    #[test]
    fn test_count_units() {
        let case = parse_ok("24 heads");
        assert_eq!(case.pattern, CasePattern::Count);
        assert_eq!(case.case_unit, CaseUnit::Heads);
        assert_eq!(case.case_quantity, 24.0);

        assert_eq!(parse_ok("12 bunches").case_unit, CaseUnit::Bunches);
        assert_eq!(parse_ok("88 count").case_unit, CaseUnit::Count);
        assert_eq!(parse_ok("100 ea").case_unit, CaseUnit::Each);
        assert_eq!(parse_ok("50 pieces").case_unit, CaseUnit::Each);
        assert_eq!(parse_ok("6 Items").case_unit, CaseUnit::Each);
    }

    #[test]
    fn test_multiply_keeps_outer_multiplier() {
        let case = parse_ok("6 x 102 oz");
        assert_eq!(case.pattern, CasePattern::Multiply);
        assert_eq!(case.case_quantity, 6.0);
        assert_eq!(case.case_unit, CaseUnit::Oz);

        let case = parse_ok("4X5LB");
        assert_eq!(case.case_quantity, 4.0);
        assert_eq!(case.case_unit, CaseUnit::Lbs);

        assert_eq!(parse_ok("12 x 1 l").case_unit, CaseUnit::L);
    }

    #[test]
    fn test_weight_units() {
        let case = parse_ok("50 lb");
        assert_eq!(case.pattern, CasePattern::Weight);
        assert_eq!(case.case_unit, CaseUnit::Lbs);
        assert_eq!(case.case_quantity, 50.0);

        assert_eq!(parse_ok("10 Pounds").case_unit, CaseUnit::Lbs);
        assert_eq!(parse_ok("5 kg").case_unit, CaseUnit::Kg);
        assert_eq!(parse_ok("2 kilograms").case_unit, CaseUnit::Kg);
        assert_eq!(parse_ok("16 ounces").case_unit, CaseUnit::Oz);
        assert_eq!(parse_ok("500g").case_unit, CaseUnit::G);
    }

    #[test]
    fn test_volume_units() {
        let case = parse_ok("4 gal");
        assert_eq!(case.pattern, CasePattern::Volume);
        assert_eq!(case.case_unit, CaseUnit::Gal);
        assert_eq!(case.case_quantity, 4.0);

        assert_eq!(parse_ok("2 gallons").case_unit, CaseUnit::Gal);
        assert_eq!(parse_ok("6 quarts").case_unit, CaseUnit::Qt);
        assert_eq!(parse_ok("3 pt").case_unit, CaseUnit::Pt);
        assert_eq!(parse_ok("8 cups").case_unit, CaseUnit::Cups);
        assert_eq!(parse_ok("32 fl oz").case_unit, CaseUnit::FlOz);
        assert_eq!(parse_ok("16 fluid ounces").case_unit, CaseUnit::FlOz);
        assert_eq!(parse_ok("1.5 liters").case_unit, CaseUnit::L);
        assert_eq!(parse_ok("750 ml").case_unit, CaseUnit::Ml);
    }

    #[test]
    fn test_gallon_is_not_read_as_grams() {
        let case = parse_ok("6 gal");
        assert_eq!(case.case_unit, CaseUnit::Gal);
    }

    #[test]
    fn test_weight_after_slash_or_multiply_is_not_a_weight() {
        for (text, qty) in [("24/8 oz", 24.0), ("12/32 oz", 12.0), ("6/10 ounce", 6.0), ("2/5 kg", 2.0)] {
            let case = parse_ok(text);
            assert_eq!(case.pattern, CasePattern::NumberOnly, "'{}'", text);
            assert_eq!(case.case_quantity, qty);
            assert_eq!(case.case_unit, CaseUnit::Each);
            assert!(case.warning.is_some());
        }

        // Not covered by the multiply rule's unit list, so the guard applies
        let case = parse_ok("6 x 102 ounces");
        assert_eq!(case.pattern, CasePattern::NumberOnly);
        assert_eq!(case.case_quantity, 6.0);

        assert_eq!(parse_ok("box of 8 oz").pattern, CasePattern::Weight);
    }

    #[test]
    fn test_thousands_separator() {
        let case = parse_ok("1,000 count");
        assert_eq!(case.pattern, CasePattern::Count);
        assert_eq!(case.case_quantity, 1000.0);
        assert_eq!(case.case_unit, CaseUnit::Count);

        assert_eq!(parse_ok("2,500#").case_quantity, 2500.0);
        assert_eq!(parse_ok("1,200 count, 50#").case_quantity, 1200.0);

        let case = parse_ok("1,250");
        assert_eq!(case.pattern, CasePattern::NumberOnly);
        assert_eq!(case.case_quantity, 1250.0);

        // A comma not followed by three digits separates values
        let case = parse_ok("120 count,50#");
        assert_eq!(case.case_quantity, 120.0);
        assert_eq!(case.secondary_quantity, Some(50.0));
    }

    #[test]
    fn test_number_only_fallback_warns() {
        let case = parse_ok("42");
        assert_eq!(case.pattern, CasePattern::NumberOnly);
        assert_eq!(case.case_quantity, 42.0);
        assert_eq!(case.case_unit, CaseUnit::Each);
        assert!(case.warning.as_deref().is_some_and(|w| !w.is_empty()));

        let case = parse_ok("12 boxes");
        assert_eq!(case.case_quantity, 12.0);
        assert!(case.warning.is_some());
    }

    #[test]
    fn test_confident_matches_have_no_warning() {
        assert!(parse_ok("25#").warning.is_none());
        assert!(parse_ok("120 count, 50#").warning.is_none());
    }

    #[test]
    fn test_failures() {
        for text in ["", "   ", "case of lettuce", "0#", "0"] {
            let result = parse_case_description(text);
            assert!(!result.is_success(), "'{}' should not parse", text);
            assert!(result.error().is_some_and(|e| !e.is_empty()));
        }
    }

    #[test]
    fn test_failure_lists_formats() {
        let result = parse_case_description("box");
        assert!(result.error().unwrap().contains("36/1#"));
    }

    #[test]
    fn test_zero_quantity_falls_through() {
        // "0 count" is rejected by the count rule; the fallback skips the zero too
        let result = parse_case_description("0 count 24 each");
        let case = result.parsed().unwrap();
        assert_eq!(case.case_quantity, 24.0);
        assert_eq!(case.pattern, CasePattern::Count);
    }

    #[test]
    fn test_parse_is_idempotent() {
        for text in ["36/1#", "120 count, 50#", "6 x 102 oz", "42", "nonsense"] {
            assert_eq!(parse_case_description(text), parse_case_description(text));
        }
    }

    #[test]
    fn test_pattern_db_names() {
        for pattern in CasePattern::CASCADE {
            assert_eq!(CasePattern::from_db_str(pattern.as_str()), Some(pattern));
        }
        assert_eq!(CasePattern::from_db_str("bogus"), None);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(parse_case_description("120 count, 50#")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["case_quantity"], 120.0);
        assert_eq!(json["case_unit"], "each");
        assert_eq!(json["pattern"], "dual_unit");
        assert_eq!(json["secondary_unit"], "lbs");

        let json = serde_json::to_value(parse_case_description("")).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().is_some());
    }
}
