//! HTTP retrieval of ANBIMA documents.

use crate::br_format::format_compact_date;
use crate::error::FetchError;
use crate::xml_tree::XmlPage;
use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, error};

/// Full IMA snapshot, always the latest published date.
pub const IMA_COMPLETO_URL: &str = "http://www.anbima.com.br/ima/arqs/ima_completo.xml";

/// Debenture credit curve documents are `<prefix><ddmmyyyy>.xml`.
pub const CREDIT_URL_PREFIX: &str = "http://www.anbima.com.br/curvas_debentures/xml/CurvaDeb_";

const USER_AGENT: &str = concat!("anbima_data/", env!("CARGO_PKG_VERSION"));

/// Where the documents are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// URL of the full IMA snapshot.
    pub ima_completo_url: String,
    /// Prefix of the per-date credit curve documents.
    pub credit_url_prefix: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ima_completo_url: IMA_COMPLETO_URL.to_string(),
            credit_url_prefix: CREDIT_URL_PREFIX.to_string(),
        }
    }
}

impl Endpoints {
    /// URL of the credit curve published for `date`.
    pub fn credit_curve_url(&self, date: &NaiveDate) -> String {
        format!("{}{}.xml", self.credit_url_prefix, format_compact_date(date))
    }
}

/// Blocking HTTP fetcher returning parsed pages.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    endpoints: Endpoints,
}

impl Fetcher {
    /// Create a fetcher for the given endpoints.
    pub fn new(endpoints: Endpoints) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                error!("failed to build HTTP client: {e}");
                FetchError::Client(e)
            })?;

        Ok(Self { client, endpoints })
    }

    /// GET `url` and parse the body as XML.
    ///
    /// Failures are logged here; the returned error says whether the request
    /// failed, the document is not published, or the body was unusable.
    pub fn fetch_page(&self, url: &str) -> Result<XmlPage, FetchError> {
        let result = self.try_fetch_page(url);
        if let Err(ref e) = result {
            error!(url, "problem requesting from ANBIMA: {e}");
        }
        result
    }

    /// Latest full IMA snapshot.
    pub fn ima_completo_page(&self) -> Result<XmlPage, FetchError> {
        self.fetch_page(&self.endpoints.ima_completo_url)
    }

    /// Credit curve document for `date`.
    pub fn credit_curve_page(&self, date: &NaiveDate) -> Result<XmlPage, FetchError> {
        self.fetch_page(&self.endpoints.credit_curve_url(date))
    }

    fn try_fetch_page(&self, url: &str) -> Result<XmlPage, FetchError> {
        debug!(url, "requesting document");

        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().map_err(transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotPublished { url: url.to_string() });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(transport)?;
        debug!(url, bytes = body.len(), "received document");

        XmlPage::from_bytes(&body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
