//! ANBIMA Fetch - CLI tool for downloading IMA-B components and credit curves.

use anbima_data::xml_tree::XmlPage;
use anbima_data::{
    br_format, fetch_credit_curve, fetch_index_components, ima_format, output, CreditCurve,
    CreditSpreadPoint, Endpoints, Error, FamilySelector, Fetcher, IndexComponent, OutputFormat, Result,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use tracing::debug;

#[derive(Parser)]
#[command(name = "anbima_fetch")]
#[command(about = "Fetch ANBIMA market data (IMA-B components, debenture credit curves)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format (json, csv)
    #[arg(long = "output-format", default_value = "json", global = true)]
    output_format: String,

    /// Output file path (or stdout if not provided)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// URL of the full IMA snapshot
    #[arg(long = "ima-url", global = true)]
    ima_url: Option<String>,

    /// Prefix of the per-date credit curve documents
    #[arg(long = "credit-url-prefix", global = true)]
    credit_url_prefix: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long = "log-level", default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Components of an IMA index family (IMA-B by default)
    Ntnb {
        /// Index family name
        #[arg(long, conflicts_with = "family_position")]
        family: Option<String>,

        /// Zero-based position of the family in the document
        #[arg(long = "family-position")]
        family_position: Option<usize>,

        /// Parse a saved document instead of downloading it
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Debenture credit curve for a reference date
    Credit {
        /// Reference date (YYYY-MM-DD or dd/mm/yyyy)
        #[arg(long, value_parser = parse_cli_date)]
        date: NaiveDate,

        /// Parse a saved document instead of downloading it
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let format = cli.output_format.parse::<OutputFormat>()?;

    let mut endpoints = Endpoints::default();
    if let Some(url) = cli.ima_url {
        endpoints.ima_completo_url = url;
    }
    if let Some(prefix) = cli.credit_url_prefix {
        endpoints.credit_url_prefix = prefix;
    }

    // Fetch and parse before touching the destination
    let records = collect_records(cli.command, endpoints)?;

    let mut out: Box<dyn Write> = match cli.output {
        Some(ref path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };

    records.write(&mut out, format)?;
    out.flush()?;
    Ok(())
}

/// Records produced by one subcommand.
#[derive(Debug)]
enum Records {
    Components(Vec<IndexComponent>),
    Points(Vec<CreditSpreadPoint>),
}

impl Records {
    fn write<W: Write>(&self, writer: &mut W, format: OutputFormat) -> Result<()> {
        match self {
            Records::Components(components) => output::write_records(writer, components, format),
            Records::Points(points) => output::write_records(writer, points, format),
        }
    }
}

fn collect_records(command: Command, endpoints: Endpoints) -> Result<Records> {
    match command {
        Command::Ntnb {
            family,
            family_position,
            input,
        } => {
            let selector = selector_for(family, family_position);

            let components = match input {
                Some(path) => {
                    debug!(%path, "parsing saved snapshot");
                    let page = XmlPage::from_read(&mut File::open(path)?)?;
                    ima_format::parse_index_components(&page, &selector)?
                }
                None => fetch_index_components(&Fetcher::new(endpoints)?, &selector)?,
            };
            Ok(Records::Components(components))
        }
        Command::Credit { date, input } => {
            let curve = match input {
                Some(path) => {
                    debug!(%path, "parsing saved curve");
                    CreditCurve::from_read(&mut File::open(path)?, date)?
                }
                None => fetch_credit_curve(&Fetcher::new(endpoints)?, date)?,
            };
            Ok(Records::Points(curve.points))
        }
    }
}

/// A position wins over a name; neither means IMA-B.
fn selector_for(family: Option<String>, family_position: Option<usize>) -> FamilySelector {
    match (family, family_position) {
        (_, Some(position)) => FamilySelector::Ordinal(position),
        (Some(name), None) => FamilySelector::Named(name),
        (None, None) => FamilySelector::default(),
    }
}

fn parse_cli_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| br_format::parse_date(s))
        .map_err(|_| Error::InvalidDate(s.to_string()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SNAPSHOT: &str = r#"<IMA>
        <FAMILIA_IMA-B>
            <TOTAIS DT_REF="29/01/2018"/>
            <CARTEIRA C_Titulo="NTNB" C_Data_Vencimento="15/08/2024" C_Taxa="5,25" C_PU="3000,00"
                      C_Duration="504,0" C_Prazo="1000" C_Convexidade="10,5"/>
        </FAMILIA_IMA-B>
    </IMA>"#;

    const CURVE: &str = r#"<CURVA>
        <VERTICES Vertice="0,5" A="1,5" AA="1" AAA="0,5" A_DI="1" AA_DI="0,75" AAA_DI="0,25"/>
    </CURVA>"#;

    fn write_input(dir: &TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("anbima_fetch").chain(args.iter().copied())).unwrap()
    }

    fn path_str(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn test_parse_cli_date_accepts_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2018, 1, 29).unwrap();

        assert_eq!(parse_cli_date("2018-01-29").unwrap(), expected);
        assert_eq!(parse_cli_date("29/01/2018").unwrap(), expected);
        assert!(parse_cli_date("29-01-2018").is_err());
    }

    #[test]
    fn test_selector_precedence() {
        assert_eq!(selector_for(Some("IMA-C".into()), Some(2)), FamilySelector::Ordinal(2));
        assert_eq!(selector_for(Some("IMA-C".into()), None), FamilySelector::Named("IMA-C".into()));
        assert_eq!(selector_for(None, None), FamilySelector::default());
    }

    #[test]
    fn test_family_options_conflict() {
        let parsed = Cli::try_parse_from(["anbima_fetch", "ntnb", "--family", "IMA-B", "--family-position", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_ntnb_input_writes_csv() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "ima_completo.xml", SNAPSHOT);
        let output = dir.path().join("components.csv");

        run(cli(&["ntnb", "--input", &input, "--output-format", "csv", "-o", path_str(&output)])).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,date,maturity date,YLD,COT,DUR,DU,CVX");
        assert_eq!(lines[1], "NTNB | 15/08/2024,2018-01-29,15/08/2024,5.25,3000.0,2.0,1000.0,10.5");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_ntnb_input_by_position() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "ima_completo.xml", SNAPSHOT);
        let output = dir.path().join("components.json");

        run(cli(&["ntnb", "-i", &input, "--family-position", "0", "-o", path_str(&output)])).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["name"], "NTNB | 15/08/2024");
        assert_eq!(value[0]["DUR"].as_f64(), Some(2.0));
    }

    #[test]
    fn test_credit_input_writes_json() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "CurvaDeb_29012018.xml", CURVE);
        let output = dir.path().join("curve.json");

        run(cli(&["credit", "--date", "29/01/2018", "--input", &input, "--output", path_str(&output)])).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let names: Vec<&str> = value.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["A", "AA", "AAA"]);
        assert_eq!(value[0]["tenor"], "0.5Y");
        assert_eq!(value[0]["date"], "2018-01-29");
        assert_eq!(value[0]["SPR"].as_f64(), Some(0.015));
    }

    #[test]
    fn test_missing_input_leaves_output_untouched() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("components.json");
        fs::write(&output, "previous").unwrap();
        let missing = dir.path().join("absent.xml");

        let err = run(cli(&["ntnb", "-i", path_str(&missing), "-o", path_str(&output)])).unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
    }

    #[test]
    fn test_parse_failure_leaves_output_untouched() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "CurvaDeb_29012018.xml", r#"<CURVA><VERTICES Vertice="x"/></CURVA>"#);
        let output = dir.path().join("curve.csv");
        fs::write(&output, "previous").unwrap();

        let result = run(cli(&["credit", "--date", "2018-01-29", "-i", &input, "-o", path_str(&output)]));

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
    }

    #[test]
    fn test_unknown_output_format_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "ima_completo.xml", SNAPSHOT);

        let err = run(cli(&["ntnb", "-i", &input, "--output-format", "xml"])).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}
