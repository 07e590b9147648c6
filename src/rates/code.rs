//! Rate codes 1-9
//!
//! A code combines an age family with an affiliation tier:
//!
//! | family \ affiliation | full | 8-15 quarters | 16-23 quarters |
//! |----------------------|------|---------------|----------------|
//! | under 62 / year one  | 1    | 2             | 3              |
//! | extended (4-6)       | 4    | 5             | 6              |
//! | senior year one      | 7    | 8             | 9              |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Age family of a rate code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeFamily {
    /// Codes 1-3
    Standard,
    /// Codes 4-6: age 70 and over, or 62-69 after the first year
    Extended,
    /// Codes 7-9: first year of a long 62-69 episode
    Senior,
}

/// Affiliation tier for a condition that pre-dates enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffiliationTier {
    /// No prior condition, or 24 quarters and more
    Full,
    /// 8 to 15 quarters: one third of the rate
    OneThird,
    /// 16 to 23 quarters: two thirds of the rate
    TwoThirds,
}

impl AffiliationTier {
    /// `None` when the claimant has too few quarters to be paid at all
    pub fn from_quarters(quarters: u32, prior_condition: bool) -> Option<Self> {
        if !prior_condition || quarters >= 24 {
            Some(AffiliationTier::Full)
        } else if quarters >= 16 {
            Some(AffiliationTier::TwoThirds)
        } else if quarters >= 8 {
            Some(AffiliationTier::OneThird)
        } else {
            None
        }
    }

    fn offset(&self) -> u8 {
        match self {
            AffiliationTier::Full => 0,
            AffiliationTier::OneThird => 1,
            AffiliationTier::TwoThirds => 2,
        }
    }
}

/// One of the nine rate codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RateCode(u8);

impl RateCode {
    pub fn new(code: u8) -> Option<Self> {
        (1..=9).contains(&code).then_some(RateCode(code))
    }

    pub fn from_parts(family: CodeFamily, tier: AffiliationTier) -> Self {
        let base = match family {
            CodeFamily::Standard => 1,
            CodeFamily::Extended => 4,
            CodeFamily::Senior => 7,
        };
        RateCode(base + tier.offset())
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn family(&self) -> CodeFamily {
        match self.0 {
            1..=3 => CodeFamily::Standard,
            4..=6 => CodeFamily::Extended,
            _ => CodeFamily::Senior,
        }
    }

    pub fn affiliation_tier(&self) -> AffiliationTier {
        match (self.0 - 1) % 3 {
            0 => AffiliationTier::Full,
            1 => AffiliationTier::OneThird,
            _ => AffiliationTier::TwoThirds,
        }
    }

    /// Share of the table rate paid under this code's affiliation tier
    pub fn affiliation_factor(&self) -> f64 {
        match self.affiliation_tier() {
            AffiliationTier::Full => 1.0,
            AffiliationTier::OneThird => 1.0 / 3.0,
            AffiliationTier::TwoThirds => 2.0 / 3.0,
        }
    }
}

impl TryFrom<u8> for RateCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        RateCode::new(value).ok_or_else(|| format!("rate code must be 1-9, got {}", value))
    }
}

impl From<RateCode> for u8 {
    fn from(code: RateCode) -> u8 {
        code.0
    }
}

impl fmt::Display for RateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
