//! Case unit vocabulary and conversion tables
//!
//! Units are a closed enumeration. Conversions are looked up by enum pair, so a
//! missing conversion is a `None` rather than a silently wrong number.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Family a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFamily {
    Weight,
    Volume,
    Count,
}

/// Canonical unit of a purchased case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseUnit {
    #[serde(rename = "lbs")]
    Lbs,
    #[serde(rename = "oz")]
    Oz,
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "each")]
    Each,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "heads")]
    Heads,
    #[serde(rename = "bunches")]
    Bunches,
    #[serde(rename = "gal")]
    Gal,
    #[serde(rename = "qt")]
    Qt,
    #[serde(rename = "pt")]
    Pt,
    #[serde(rename = "cups")]
    Cups,
    #[serde(rename = "fl oz")]
    FlOz,
    #[serde(rename = "l")]
    L,
    #[serde(rename = "ml")]
    Ml,
}

impl CaseUnit {
    pub const ALL: [CaseUnit; 15] = [
        CaseUnit::Lbs,
        CaseUnit::Oz,
        CaseUnit::Kg,
        CaseUnit::G,
        CaseUnit::Each,
        CaseUnit::Count,
        CaseUnit::Heads,
        CaseUnit::Bunches,
        CaseUnit::Gal,
        CaseUnit::Qt,
        CaseUnit::Pt,
        CaseUnit::Cups,
        CaseUnit::FlOz,
        CaseUnit::L,
        CaseUnit::Ml,
    ];

    /// Canonical name, also the database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseUnit::Lbs => "lbs",
            CaseUnit::Oz => "oz",
            CaseUnit::Kg => "kg",
            CaseUnit::G => "g",
            CaseUnit::Each => "each",
            CaseUnit::Count => "count",
            CaseUnit::Heads => "heads",
            CaseUnit::Bunches => "bunches",
            CaseUnit::Gal => "gal",
            CaseUnit::Qt => "qt",
            CaseUnit::Pt => "pt",
            CaseUnit::Cups => "cups",
            CaseUnit::FlOz => "fl oz",
            CaseUnit::L => "l",
            CaseUnit::Ml => "ml",
        }
    }

    /// Recognize a user-entered unit token, collapsing synonyms
    ///
    /// `#` is vendor shorthand for pounds. Returns `None` for anything outside
    /// the vocabulary (e.g. "scoop", "slice").
    pub fn from_token(token: &str) -> Option<Self> {
        let lower = token.trim().to_lowercase();
        let collapsed = lower.split_whitespace().collect::<Vec<_>>().join(" ");

        match collapsed.trim_end_matches('.') {
            "#" | "lb" | "lbs" | "pound" | "pounds" => Some(CaseUnit::Lbs),
            "oz" | "ounce" | "ounces" => Some(CaseUnit::Oz),
            "kg" | "kgs" | "kilogram" | "kilograms" => Some(CaseUnit::Kg),
            "g" | "gram" | "grams" => Some(CaseUnit::G),
            "each" | "ea" | "piece" | "pieces" | "pc" | "pcs" | "item" | "items" => {
                Some(CaseUnit::Each)
            }
            "count" | "ct" => Some(CaseUnit::Count),
            "head" | "heads" => Some(CaseUnit::Heads),
            "bunch" | "bunches" => Some(CaseUnit::Bunches),
            "gal" | "gallon" | "gallons" => Some(CaseUnit::Gal),
            "qt" | "quart" | "quarts" => Some(CaseUnit::Qt),
            "pt" | "pint" | "pints" => Some(CaseUnit::Pt),
            "cup" | "cups" => Some(CaseUnit::Cups),
            "fl oz" | "floz" | "fl. oz" | "fl.oz" | "fluid ounce" | "fluid ounces" => Some(CaseUnit::FlOz),
            "l" | "liter" | "liters" | "litre" | "litres" => Some(CaseUnit::L),
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Some(CaseUnit::Ml)
            }
            _ => None,
        }
    }

    pub fn family(&self) -> UnitFamily {
        match self {
            CaseUnit::Lbs | CaseUnit::Oz | CaseUnit::Kg | CaseUnit::G => UnitFamily::Weight,
            CaseUnit::Gal
            | CaseUnit::Qt
            | CaseUnit::Pt
            | CaseUnit::Cups
            | CaseUnit::FlOz
            | CaseUnit::L
            | CaseUnit::Ml => UnitFamily::Volume,
            CaseUnit::Each | CaseUnit::Count | CaseUnit::Heads | CaseUnit::Bunches => {
                UnitFamily::Count
            }
        }
    }

    /// Whether a per-unit cost in this unit reads as a per-item cost
    pub fn is_count_like(&self) -> bool {
        self.family() == UnitFamily::Count
    }
}

impl fmt::Display for CaseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference units the calculator reports derived costs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostBasis {
    Pound,
    Ounce,
    Each,
}

// ============================================================================
// Conversion Tables
// ============================================================================

/// Ounces per pound
pub const OZ_PER_LB: f64 = 16.0;

/// How many `basis` units one `unit` holds, for derived cost reporting
///
/// Pounds report per-ounce cost but ounces have no per-pound entry. A fluid
/// ounce case reports its cost as per-ounce.
pub fn basis_factor(unit: CaseUnit, basis: CostBasis) -> Option<f64> {
    match (unit, basis) {
        (CaseUnit::Lbs, CostBasis::Pound) => Some(1.0),
        (CaseUnit::Lbs, CostBasis::Ounce) => Some(OZ_PER_LB),
        (CaseUnit::Oz | CaseUnit::FlOz, CostBasis::Ounce) => Some(1.0),
        (u, CostBasis::Each) if u.is_count_like() => Some(1.0),
        _ => None,
    }
}

/// How many `to` units one `from` unit holds, for recipe quantity costing
pub fn units_per(from: CaseUnit, to: CaseUnit) -> Option<f64> {
    match (from, to) {
        (a, b) if a == b => Some(1.0),
        (CaseUnit::Lbs, CaseUnit::Oz) => Some(OZ_PER_LB),
        (CaseUnit::Oz, CaseUnit::Lbs) => Some(1.0 / OZ_PER_LB),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token_synonyms() {
        assert_eq!(CaseUnit::from_token("#"), Some(CaseUnit::Lbs));
        assert_eq!(CaseUnit::from_token("LB"), Some(CaseUnit::Lbs));
        assert_eq!(CaseUnit::from_token("Pounds"), Some(CaseUnit::Lbs));
        assert_eq!(CaseUnit::from_token("ea"), Some(CaseUnit::Each));
        assert_eq!(CaseUnit::from_token("items"), Some(CaseUnit::Each));
        assert_eq!(CaseUnit::from_token("head"), Some(CaseUnit::Heads));
        assert_eq!(CaseUnit::from_token("fl  oz"), Some(CaseUnit::FlOz));
        assert_eq!(CaseUnit::from_token("fluid ounce"), Some(CaseUnit::FlOz));
        assert_eq!(CaseUnit::from_token("litres"), Some(CaseUnit::L));
        assert_eq!(CaseUnit::from_token("scoop"), None);
        assert_eq!(CaseUnit::from_token(""), None);
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for unit in CaseUnit::ALL {
            assert_eq!(CaseUnit::from_token(unit.as_str()), Some(unit));
        }
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&CaseUnit::FlOz).unwrap();
        assert_eq!(json, "\"fl oz\"");
        let unit: CaseUnit = serde_json::from_str("\"lbs\"").unwrap();
        assert_eq!(unit, CaseUnit::Lbs);
    }

    #[test]
    fn test_families() {
        assert_eq!(CaseUnit::Kg.family(), UnitFamily::Weight);
        assert_eq!(CaseUnit::Cups.family(), UnitFamily::Volume);
        assert_eq!(CaseUnit::Bunches.family(), UnitFamily::Count);
        assert!(CaseUnit::Heads.is_count_like());
        assert!(!CaseUnit::Ml.is_count_like());
    }

    #[test]
    fn test_basis_factor() {
        assert_eq!(basis_factor(CaseUnit::Lbs, CostBasis::Ounce), Some(16.0));
        assert_eq!(basis_factor(CaseUnit::Oz, CostBasis::Ounce), Some(1.0));
        assert_eq!(basis_factor(CaseUnit::FlOz, CostBasis::Ounce), Some(1.0));
        assert_eq!(basis_factor(CaseUnit::FlOz, CostBasis::Pound), None);
        assert_eq!(basis_factor(CaseUnit::Oz, CostBasis::Pound), None);
        assert_eq!(basis_factor(CaseUnit::Kg, CostBasis::Pound), None);
        assert_eq!(basis_factor(CaseUnit::Count, CostBasis::Each), Some(1.0));
        assert_eq!(basis_factor(CaseUnit::Gal, CostBasis::Each), None);
    }

    #[test]
    fn test_units_per() {
        assert_eq!(units_per(CaseUnit::Lbs, CaseUnit::Oz), Some(16.0));
        assert_eq!(units_per(CaseUnit::Oz, CaseUnit::Lbs), Some(0.0625));
        assert_eq!(units_per(CaseUnit::Gal, CaseUnit::Gal), Some(1.0));
        assert_eq!(units_per(CaseUnit::Kg, CaseUnit::G), None);
    }
}
