//! Translation of ANBIMA attribute names into output measures.

use rust_decimal::Decimal;

/// Trading days per year, used to annualize durations quoted in business days.
pub const BUSINESS_DAYS_PER_YEAR: u32 = 252;

/// A numeric measure published for an index or one of its bonds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    /// Yield (`YLD`).
    Yield,
    /// Unit price or index number (`COT`).
    Quote,
    /// Duration, annualized (`DUR`).
    Duration,
    /// Term in business days (`DU`).
    BusinessDays,
    /// Convexity (`CVX`).
    Convexity,
}

impl Measure {
    /// Convert a published value into output units.
    ///
    /// Durations are published in business days and reported in years.
    pub fn normalize(&self, raw: Decimal) -> Decimal {
        match self {
            Measure::Duration => raw / Decimal::from(BUSINESS_DAYS_PER_YEAR),
            _ => raw,
        }
    }
}

/// One group of attribute-to-measure translations.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    entries: &'static [(&'static str, Measure)],
}

impl FieldMap {
    /// Source attribute names paired with their measures, in output order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, Measure)> {
        self.entries.iter().copied()
    }
}

/// Attributes of the family `TOTAIS` node.
pub const INDEX_FIELDS: FieldMap = FieldMap {
    entries: &[
        ("T_Yield", Measure::Yield),
        ("T_Duration", Measure::Duration),
        ("T_Num_Indice", Measure::Quote),
    ],
};

/// Attributes of each `CARTEIRA` node.
pub const PORTFOLIO_FIELDS: FieldMap = FieldMap {
    entries: &[
        ("C_Taxa", Measure::Yield),
        ("C_PU", Measure::Quote),
        ("C_Duration", Measure::Duration),
        ("C_Prazo", Measure::BusinessDays),
        ("C_Convexidade", Measure::Convexity),
    ],
};
