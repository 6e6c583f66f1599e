//! Debenture credit curve parser.
//!
//! Each `VERTICES` node of a `CurvaDeb_<ddmmyyyy>.xml` document is one tenor.
//! It carries the tenor in `Vertice` and, per rating, the spread (`A`, `AA`,
//! `AAA`) and the spread over DI (`A_DI`, `AA_DI`, `AAA_DI`), in percent.

use crate::br_format::{parse_decimal, tenor_label};
use crate::error::Result;
use crate::types::{CreditSpreadPoint, Rating};
use crate::xml_tree::{XmlNode, XmlPage};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Read;

/// Tenor nodes.
pub const VERTEX_TAG: &str = "VERTICES";

/// Tenor attribute of a vertex node.
pub const TENOR_ATTR: &str = "Vertice";

/// Decimal places kept on spreads.
pub const SPREAD_SCALE: u32 = 8;

/// A credit curve for one reference date.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditCurve {
    /// Reference date of the curve.
    pub date: NaiveDate,
    /// One point per vertex and rating, vertex order first.
    pub points: Vec<CreditSpreadPoint>,
}

impl CreditCurve {
    /// Parse a saved curve document from any source implementing `Read`.
    ///
    /// The document does not state its own date, so the caller supplies it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use anbima_data::credit_format::CreditCurve;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2018, 1, 29).unwrap();
    /// let mut file = File::open("CurvaDeb_29012018.xml")?;
    /// let curve = CreditCurve::from_read(&mut file, date)?;
    /// println!("{} points", curve.points.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R, date: NaiveDate) -> Result<Self> {
        let page = XmlPage::from_read(reader)?;
        Self::from_page(&page, date)
    }

    /// Build the curve from an already parsed page.
    pub fn from_page(page: &XmlPage, date: NaiveDate) -> Result<Self> {
        let points = parse_credit_curve(page, date)?;
        Ok(CreditCurve { date, points })
    }

    /// Points of a single rating, in tenor order.
    pub fn points_for(&self, rating: Rating) -> impl Iterator<Item = &CreditSpreadPoint> {
        self.points.iter().filter(move |p| p.rating == rating)
    }
}

/// All spread points of the page, `[A, AA, AAA]` for each vertex in turn.
pub fn parse_credit_curve(page: &XmlPage, date: NaiveDate) -> Result<Vec<CreditSpreadPoint>> {
    let vertices = page.find_all_named(VERTEX_TAG);
    let mut points = Vec::with_capacity(vertices.len() * Rating::ALL.len());

    for vertex in vertices {
        let tenor = tenor_label(vertex.attr(TENOR_ATTR)?);

        for rating in Rating::ALL {
            points.push(CreditSpreadPoint {
                rating,
                tenor: tenor.clone(),
                date,
                spr: spread(vertex, rating.code())?,
                di1: spread(vertex, &rating.di_attribute())?,
            });
        }
    }

    Ok(points)
}

/// Percent attribute as a fraction, rounded to [`SPREAD_SCALE`] places.
fn spread(vertex: &XmlNode, attribute: &str) -> Result<Decimal> {
    let percent = parse_decimal(vertex.attr(attribute)?)?;
    Ok((percent / Decimal::ONE_HUNDRED).round_dp(SPREAD_SCALE))
}
