//! Benefit classes and the income-based class determination

use serde::{Deserialize, Serialize};

/// Contribution class selecting one column family of the rate table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BenefitClass {
    A,
    B,
    C,
}

impl BenefitClass {
    /// Determine the class from income two years prior against the ceiling
    ///
    /// Income below one ceiling is class A, up to and including three
    /// ceilings is class B, anything above is class C. A claimant assessed
    /// by default (no declared income) is always class A.
    pub fn from_income(income: f64, ceiling: f64, assessed_by_default: bool) -> Self {
        if assessed_by_default || income < ceiling {
            BenefitClass::A
        } else if income <= 3.0 * ceiling {
            BenefitClass::B
        } else {
            BenefitClass::C
        }
    }

    /// Ceiling multiple used by the post-reform formula
    pub fn multiplier(&self) -> f64 {
        match self {
            BenefitClass::A => 1.0,
            BenefitClass::B => 2.0,
            BenefitClass::C => 3.0,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            BenefitClass::A => 0,
            BenefitClass::B => 1,
            BenefitClass::C => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BenefitClass::A => "A",
            BenefitClass::B => "B",
            BenefitClass::C => "C",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(BenefitClass::A),
            "B" => Some(BenefitClass::B),
            "C" => Some(BenefitClass::C),
            _ => None,
        }
    }
}
