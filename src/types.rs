//! Records produced by the parsers.

use crate::error::Error;
use crate::field_map::Measure;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One bond's membership record in an index family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexComponent {
    /// Alias made of title and maturity, e.g. `NTN-B | 15/08/2024`.
    pub name: String,

    /// Reference date of the snapshot.
    pub date: NaiveDate,

    /// Maturity date as published (`dd/mm/yyyy`).
    #[serde(rename = "maturity date")]
    pub maturity_date: String,

    /// Yield.
    #[serde(rename = "YLD")]
    pub yld: Decimal,

    /// Unit price.
    #[serde(rename = "COT")]
    pub cot: Decimal,

    /// Duration in years.
    #[serde(rename = "DUR")]
    pub dur: Decimal,

    /// Term in business days.
    #[serde(rename = "DU")]
    pub du: Decimal,

    /// Convexity.
    #[serde(rename = "CVX")]
    pub cvx: Decimal,
}

impl IndexComponent {
    /// Slot holding a measure.
    pub fn measure_mut(&mut self, measure: Measure) -> &mut Decimal {
        match measure {
            Measure::Yield => &mut self.yld,
            Measure::Quote => &mut self.cot,
            Measure::Duration => &mut self.dur,
            Measure::BusinessDays => &mut self.du,
            Measure::Convexity => &mut self.cvx,
        }
    }
}

/// Family-level summary taken from the `TOTAIS` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexTotals {
    /// Tag name of the family the totals belong to.
    pub index: String,

    /// Reference date of the snapshot.
    pub date: NaiveDate,

    /// Yield.
    #[serde(rename = "YLD")]
    pub yld: Decimal,

    /// Duration in years.
    #[serde(rename = "DUR")]
    pub dur: Decimal,

    /// Index number.
    #[serde(rename = "COT")]
    pub cot: Decimal,
}

impl IndexTotals {
    /// Slot holding a measure, if the summary carries it.
    pub fn measure_mut(&mut self, measure: Measure) -> Option<&mut Decimal> {
        match measure {
            Measure::Yield => Some(&mut self.yld),
            Measure::Duration => Some(&mut self.dur),
            Measure::Quote => Some(&mut self.cot),
            Measure::BusinessDays | Measure::Convexity => None,
        }
    }
}

/// Credit rating bucket of the debenture curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    A,
    AA,
    AAA,
}

impl Rating {
    /// All ratings, in publication order.
    pub const ALL: [Rating; 3] = [Rating::A, Rating::AA, Rating::AAA];

    /// Code used as attribute name on vertex nodes.
    pub fn code(&self) -> &'static str {
        match self {
            Rating::A => "A",
            Rating::AA => "AA",
            Rating::AAA => "AAA",
        }
    }

    /// Attribute holding the spread over DI for this rating.
    pub fn di_attribute(&self) -> String {
        format!("{}_DI", self.code())
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Rating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Rating::A),
            "AA" => Ok(Rating::AA),
            "AAA" => Ok(Rating::AAA),
            _ => Err(Error::InvalidRating(s.to_string())),
        }
    }
}

/// Spread of one rating at one tenor of the credit curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSpreadPoint {
    #[serde(rename = "name")]
    pub rating: Rating,

    /// Tenor label in years, e.g. `0.5Y`.
    pub tenor: String,

    /// Reference date of the curve.
    pub date: NaiveDate,

    /// Spread as a decimal fraction.
    #[serde(rename = "SPR")]
    pub spr: Decimal,

    /// Spread over DI as a decimal fraction.
    #[serde(rename = "DI1")]
    pub di1: Decimal,
}
