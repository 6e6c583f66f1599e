//! ANBIMA Market Data Library
//!
//! Fetches and parses fixed-income reference data published as XML by
//! ANBIMA, turning comma-decimal and `dd/mm/yyyy` attribute strings into
//! typed records.
//!
//! # Datasets
//!
//! - **IMA-B components**: NTN-B bonds of the IMA-B index family, from the
//!   latest `ima_completo.xml` snapshot
//! - **Debenture credit curve**: spreads per rating (`A`, `AA`, `AAA`) and
//!   tenor for a given reference date
//!
//! # Examples
//!
//! ## Latest IMA-B components
//!
//! ```no_run
//! let components = anbima_data::get_ntnb_data()?;
//! for bond in &components {
//!     println!("{}: yield {} duration {}", bond.name, bond.yld, bond.dur);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Credit curve for a date
//!
//! ```no_run
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2018, 1, 29).unwrap();
//! let points = anbima_data::get_credit_data(date)?;
//! assert_eq!(points.len() % 3, 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod br_format;
pub mod credit_format;
pub mod error;
pub mod fetcher;
pub mod field_map;
pub mod ima_format;
pub mod output;
pub mod types;
pub mod xml_tree;

use chrono::NaiveDate;
use tracing::info;

// Re-export commonly used types
pub use credit_format::CreditCurve;
pub use error::{Error, FetchError, Result};
pub use fetcher::{Endpoints, Fetcher};
pub use ima_format::{FamilySelector, ImaSnapshot};
pub use output::OutputFormat;
pub use types::{CreditSpreadPoint, IndexComponent, IndexTotals, Rating};

/// Components of the latest IMA-B snapshot, in document order.
pub fn get_ntnb_data() -> Result<Vec<IndexComponent>> {
    let fetcher = Fetcher::new(Endpoints::default())?;
    fetch_index_components(&fetcher, &FamilySelector::default())
}

/// Credit curve points published for `date`.
pub fn get_credit_data(date: NaiveDate) -> Result<Vec<CreditSpreadPoint>> {
    let fetcher = Fetcher::new(Endpoints::default())?;
    fetch_credit_curve(&fetcher, date).map(|curve| curve.points)
}

/// Fetch the snapshot and extract the selected family's components.
pub fn fetch_index_components(fetcher: &Fetcher, selector: &FamilySelector) -> Result<Vec<IndexComponent>> {
    let page = fetcher.ima_completo_page()?;
    let components = ima_format::parse_index_components(&page, selector)?;

    info!(family = %selector, count = components.len(), "parsed index components");
    Ok(components)
}

/// Fetch the snapshot and extract the selected family's totals and components.
pub fn fetch_ima_snapshot(fetcher: &Fetcher, selector: &FamilySelector) -> Result<ImaSnapshot> {
    let page = fetcher.ima_completo_page()?;
    let snapshot = ImaSnapshot::from_page(&page, selector)?;

    info!(
        family = %snapshot.totals.index,
        date = %snapshot.totals.date,
        count = snapshot.components.len(),
        "parsed index snapshot"
    );
    Ok(snapshot)
}

/// Fetch and parse the credit curve published for `date`.
pub fn fetch_credit_curve(fetcher: &Fetcher, date: NaiveDate) -> Result<CreditCurve> {
    let page = fetcher.credit_curve_page(&date)?;
    let curve = CreditCurve::from_page(&page, date)?;

    info!(%date, count = curve.points.len(), "parsed credit curve");
    Ok(curve)
}
