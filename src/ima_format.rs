//! IMA snapshot parser.
//!
//! The `ima_completo.xml` document groups bonds by index family. Each family
//! element (tag name containing `FAMILIA`) holds `TOTAIS` summary nodes and
//! one `CARTEIRA` node per bond, with every value stored as an attribute.

use crate::br_format::{parse_date, parse_decimal};
use crate::error::{Error, Result};
use crate::field_map::{FieldMap, Measure, INDEX_FIELDS, PORTFOLIO_FIELDS};
use crate::types::{IndexComponent, IndexTotals};
use crate::xml_tree::{XmlNode, XmlPage};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Read;

/// Substring shared by every family tag name.
pub const FAMILY_TAG_PATTERN: &str = "FAMILIA";

/// Family summary nodes.
pub const TOTALS_TAG: &str = "TOTAIS";

/// Index member nodes.
pub const PORTFOLIO_TAG: &str = "CARTEIRA";

/// Reference date attribute of the summary node.
pub const REFERENCE_DATE_ATTR: &str = "DT_REF";

/// Bond title attribute of a member node.
pub const TITLE_ATTR: &str = "C_Titulo";

/// Maturity date attribute of a member node.
pub const MATURITY_ATTR: &str = "C_Data_Vencimento";

/// Name of the NTN-B index family.
pub const IMA_B: &str = "IMA-B";

/// Position of the IMA-B family among the published families.
pub const IMA_B_ORDINAL: usize = 5;

/// How to pick one family out of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilySelector {
    /// The n-th family element (0-based) in document order.
    Ordinal(usize),
    /// The family identified by its index name.
    ///
    /// Matches when the tag name is the index name (or ends with it after a
    /// `_`, `-` or space), or when the family element or its first `TOTAIS`
    /// node has an attribute whose value is the index name.
    Named(String),
}

impl Default for FamilySelector {
    fn default() -> Self {
        FamilySelector::Named(IMA_B.to_string())
    }
}

impl FamilySelector {
    /// Locate the selected family element.
    pub fn select<'a>(&self, page: &'a XmlPage) -> Result<&'a XmlNode> {
        let families = page.find_all(|name| name.contains(FAMILY_TAG_PATTERN));

        let found = match self {
            FamilySelector::Ordinal(position) => families.get(*position).copied(),
            FamilySelector::Named(index) => families
                .into_iter()
                .find(|family| family_has_name(family, index)),
        };

        found.ok_or_else(|| Error::MissingElement(format!("{FAMILY_TAG_PATTERN} family ({self})")))
    }
}

impl std::fmt::Display for FamilySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FamilySelector::Ordinal(position) => write!(f, "position {position}"),
            FamilySelector::Named(index) => write!(f, "named {index}"),
        }
    }
}

fn family_has_name(family: &XmlNode, index: &str) -> bool {
    let tag = family.name();
    if tag.eq_ignore_ascii_case(index) {
        return true;
    }
    if let Some(split) = tag.len().checked_sub(index.len()) {
        if let (Some(head), Some(tail)) = (tag.get(..split), tag.get(split..)) {
            if tail.eq_ignore_ascii_case(index) && head.ends_with(['_', '-', ' ']) {
                return true;
            }
        }
    }

    let carries_name = |node: &XmlNode| {
        node.attributes()
            .any(|(_, value)| value.trim().eq_ignore_ascii_case(index))
    };

    carries_name(family) || family.find_first(TOTALS_TAG).is_some_and(carries_name)
}

/// One index family: its summary and its members in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImaSnapshot {
    /// Family summary.
    pub totals: IndexTotals,
    /// Family members.
    pub components: Vec<IndexComponent>,
}

impl ImaSnapshot {
    /// Parse a saved `ima_completo.xml` from any source implementing `Read`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use anbima_data::ima_format::{FamilySelector, ImaSnapshot};
    ///
    /// let mut file = File::open("ima_completo.xml")?;
    /// let snapshot = ImaSnapshot::from_read(&mut file, &FamilySelector::default())?;
    /// println!("{} bonds on {}", snapshot.components.len(), snapshot.totals.date);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R, selector: &FamilySelector) -> Result<Self> {
        let page = XmlPage::from_read(reader)?;
        Self::from_page(&page, selector)
    }

    /// Extract the selected family from an already parsed page.
    pub fn from_page(page: &XmlPage, selector: &FamilySelector) -> Result<Self> {
        let family = selector.select(page)?;
        let totals_node = first_totals(family)?;
        let date = parse_date(totals_node.attr(REFERENCE_DATE_ATTR)?)?;

        Ok(ImaSnapshot {
            totals: parse_totals(family.name(), totals_node, date)?,
            components: parse_members(family, date)?,
        })
    }
}

/// Members of the selected family, in document order.
///
/// Only the `DT_REF` attribute of the summary node is read, so this works on
/// documents whose `TOTAIS` nodes carry no measures.
pub fn parse_index_components(page: &XmlPage, selector: &FamilySelector) -> Result<Vec<IndexComponent>> {
    let family = selector.select(page)?;
    let date = parse_date(first_totals(family)?.attr(REFERENCE_DATE_ATTR)?)?;
    parse_members(family, date)
}

/// Summary of the selected family.
pub fn parse_index_totals(page: &XmlPage, selector: &FamilySelector) -> Result<IndexTotals> {
    let family = selector.select(page)?;
    let totals_node = first_totals(family)?;
    let date = parse_date(totals_node.attr(REFERENCE_DATE_ATTR)?)?;
    parse_totals(family.name(), totals_node, date)
}

fn parse_members(family: &XmlNode, date: NaiveDate) -> Result<Vec<IndexComponent>> {
    family
        .find_all_named(PORTFOLIO_TAG)
        .into_iter()
        .map(|member| parse_component(member, date))
        .collect()
}

fn first_totals(family: &XmlNode) -> Result<&XmlNode> {
    family
        .find_first(TOTALS_TAG)
        .ok_or_else(|| Error::MissingElement(format!("{TOTALS_TAG} in <{}>", family.name())))
}

/// Parse every attribute of `fields` on `node`, in field map order.
fn read_measures<'a>(
    node: &'a XmlNode,
    fields: &FieldMap,
) -> impl Iterator<Item = Result<(Measure, Decimal)>> + 'a {
    fields.entries().map(move |(attribute, measure)| -> Result<(Measure, Decimal)> {
        let raw = parse_decimal(node.attr(attribute)?)?;
        Ok((measure, measure.normalize(raw)))
    })
}

fn parse_totals(index: &str, node: &XmlNode, date: NaiveDate) -> Result<IndexTotals> {
    let mut totals = IndexTotals {
        index: index.to_string(),
        date,
        yld: Decimal::ZERO,
        dur: Decimal::ZERO,
        cot: Decimal::ZERO,
    };

    for entry in read_measures(node, &INDEX_FIELDS) {
        let (measure, value) = entry?;
        if let Some(slot) = totals.measure_mut(measure) {
            *slot = value;
        }
    }

    Ok(totals)
}

fn parse_component(node: &XmlNode, date: NaiveDate) -> Result<IndexComponent> {
    let title = node.attr(TITLE_ATTR)?;
    let maturity = node.attr(MATURITY_ATTR)?;

    let mut component = IndexComponent {
        name: format!("{title} | {maturity}"),
        date,
        maturity_date: maturity.to_string(),
        yld: Decimal::ZERO,
        cot: Decimal::ZERO,
        dur: Decimal::ZERO,
        du: Decimal::ZERO,
        cvx: Decimal::ZERO,
    };

    for entry in read_measures(node, &PORTFOLIO_FIELDS) {
        let (measure, value) = entry?;
        *component.measure_mut(measure) = value;
    }

    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"<?xml version="1.0"?>
<IMA>
  <FAMILIA>
    <TOTAIS DT_REF="29/01/2018"/>
    <CARTEIRA C_Titulo="NTNB" C_Data_Vencimento="15/08/2024" C_Taxa="5,25" C_PU="3000,00"
              C_Duration="504,0" C_Prazo="1000" C_Convexidade="10,5"/>
  </FAMILIA>
</IMA>"#;

    fn family(tag: &str, date: &str, titles: &[&str]) -> String {
        let members: String = titles
            .iter()
            .map(|t| {
                format!(
                    r#"<CARTEIRA C_Titulo="{t}" C_Data_Vencimento="15/05/2035" C_Taxa="5,1" C_PU="3500,5" C_Duration="2520,0" C_Prazo="4000" C_Convexidade="1,5"/>"#
                )
            })
            .collect();
        format!(
            r#"<{tag}><TOTAIS DT_REF="{date}" T_Yield="5" T_Duration="252" T_Num_Indice="1000"/><COMPONENTES>{members}</COMPONENTES></{tag}>"#
        )
    }

    fn snapshot_document() -> String {
        let families = [
            family("FAMILIA_IRF-M1", "01/02/2018", &["LTN"]),
            family("FAMILIA_IRF-M1_PLUS", "01/02/2018", &["LTN", "NTN-F"]),
            family("FAMILIA_IRF-M", "01/02/2018", &["LTN"]),
            family("FAMILIA_IMA-B5", "01/02/2018", &["NTN-B"]),
            family("FAMILIA_IMA-B5_PLUS", "01/02/2018", &["NTN-B"]),
            family("FAMILIA_IMA-B", "02/02/2018", &["NTN-B", "NTN-B", "NTN-B"]),
            family("FAMILIA_IMA-S", "01/02/2018", &["LFT"]),
        ];
        format!("<ANBIMA>{}</ANBIMA>", families.concat())
    }

    #[test]
    fn test_minimal_document() {
        let page = XmlPage::parse(MINIMAL).unwrap();
        let components = parse_index_components(&page, &FamilySelector::Ordinal(0)).unwrap();

        assert_eq!(
            components,
            vec![IndexComponent {
                name: "NTNB | 15/08/2024".into(),
                date: NaiveDate::from_ymd_opt(2018, 1, 29).unwrap(),
                maturity_date: "15/08/2024".into(),
                yld: Decimal::new(525, 2),
                cot: Decimal::new(30000, 1),
                dur: Decimal::new(20, 1),
                du: Decimal::from(1000),
                cvx: Decimal::new(105, 1),
            }]
        );
    }

    #[test]
    fn test_totals() {
        let xml = MINIMAL.replace(
            r#"<TOTAIS DT_REF="29/01/2018"/>"#,
            r#"<TOTAIS DT_REF="29/01/2018" T_Yield="5,0" T_Duration="1260,0" T_Num_Indice="4500,123"/>"#,
        );
        let page = XmlPage::parse(&xml).unwrap();
        let totals = parse_index_totals(&page, &FamilySelector::Ordinal(0)).unwrap();

        assert_eq!(totals.index, "FAMILIA");
        assert_eq!(totals.date, NaiveDate::from_ymd_opt(2018, 1, 29).unwrap());
        assert_eq!(totals.yld, Decimal::from(5));
        assert_eq!(totals.dur, Decimal::from(5));
        assert_eq!(totals.cot, Decimal::new(4500123, 3));
    }

    #[test]
    fn test_totals_without_measures() {
        let page = XmlPage::parse(MINIMAL).unwrap();
        let err = parse_index_totals(&page, &FamilySelector::Ordinal(0)).unwrap_err();

        assert!(matches!(
            err,
            Error::MissingAttribute { ref attribute, .. } if attribute == "T_Yield"
        ));
    }

    #[test]
    fn test_named_selector_finds_ima_b() {
        let page = XmlPage::parse(&snapshot_document()).unwrap();
        let snapshot = ImaSnapshot::from_page(&page, &FamilySelector::default()).unwrap();

        assert_eq!(snapshot.totals.index, "FAMILIA_IMA-B");
        assert_eq!(snapshot.components.len(), 3);
        assert!(snapshot
            .components
            .iter()
            .all(|c| c.date == NaiveDate::from_ymd_opt(2018, 2, 2).unwrap()));
        assert_eq!(snapshot.components[0].dur, Decimal::from(10));
        assert_eq!(snapshot.totals.dur, Decimal::ONE);
    }

    #[test]
    fn test_ordinal_selector_matches_named() {
        let page = XmlPage::parse(&snapshot_document()).unwrap();

        let by_position = ImaSnapshot::from_page(&page, &FamilySelector::Ordinal(IMA_B_ORDINAL)).unwrap();
        let by_name = ImaSnapshot::from_page(&page, &FamilySelector::default()).unwrap();

        assert_eq!(by_position, by_name);
    }

    #[test]
    fn test_named_selector_uses_totals_attribute() {
        let xml = r#"<IMA>
            <FAMILIA><TOTAIS INDICE="IMA-B 5" DT_REF="29/01/2018" T_Yield="1" T_Duration="1" T_Num_Indice="1"/></FAMILIA>
            <FAMILIA><TOTAIS INDICE="IMA-B" DT_REF="30/01/2018" T_Yield="1" T_Duration="1" T_Num_Indice="1"/></FAMILIA>
        </IMA>"#;
        let page = XmlPage::parse(xml).unwrap();
        let totals = parse_index_totals(&page, &FamilySelector::default()).unwrap();

        assert_eq!(totals.date, NaiveDate::from_ymd_opt(2018, 1, 30).unwrap());
    }

    #[test]
    fn test_record_count_matches_members() {
        let page = XmlPage::parse(&snapshot_document()).unwrap();
        for position in 0..7 {
            let selector = FamilySelector::Ordinal(position);
            let family = selector.select(&page).unwrap();
            let components = parse_index_components(&page, &selector).unwrap();
            assert_eq!(components.len(), family.find_all_named(PORTFOLIO_TAG).len());
        }
    }

    #[test]
    fn test_missing_family() {
        let page = XmlPage::parse(MINIMAL).unwrap();

        let err = parse_index_components(&page, &FamilySelector::Ordinal(IMA_B_ORDINAL)).unwrap_err();
        assert!(matches!(err, Error::MissingElement(_)));

        let err = parse_index_components(&page, &FamilySelector::default()).unwrap_err();
        assert!(matches!(err, Error::MissingElement(_)));
    }

    #[test]
    fn test_missing_attribute_aborts() {
        let xml = MINIMAL.replace(r#" C_Convexidade="10,5""#, "");
        let page = XmlPage::parse(&xml).unwrap();

        let err = parse_index_components(&page, &FamilySelector::Ordinal(0)).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAttribute { ref attribute, .. } if attribute == "C_Convexidade"
        ));
    }

    #[test]
    fn test_malformed_number_aborts() {
        let xml = MINIMAL.replace("C_PU=\"3000,00\"", "C_PU=\"--\"");
        let page = XmlPage::parse(&xml).unwrap();

        assert!(matches!(
            parse_index_components(&page, &FamilySelector::Ordinal(0)),
            Err(Error::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_from_read() {
        let xml = snapshot_document();
        let mut input = xml.as_bytes();
        let snapshot = ImaSnapshot::from_read(&mut input, &FamilySelector::Ordinal(1)).unwrap();

        assert_eq!(snapshot.totals.index, "FAMILIA_IRF-M1_PLUS");
        assert_eq!(snapshot.components.len(), 2);
    }
}
