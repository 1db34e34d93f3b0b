use reqwest::{header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT}, Client};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use super::IndustryDataProvider;
use crate::error::RetrievalError;
use crate::models::{Company, Config, IndustryGroup};
use crate::utils::{first_key, normalize_text, pad_industry_code, value_to_string};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0 Safari/537.36";

const INDUSTRY_TYPE: &str = "IndustrialGroup";
const INDUSTRY_NAME_KEYS: [&str; 9] = [
    "name", "Name", "title", "Title", "lVal", "lval", "lTitle", "value", "Value",
];
const COMPANY_ID_KEYS: [&str; 5] = ["insCode", "InsCode", "i", "Id", "id"];
const COMPANY_SYMBOL_KEYS: [&str; 4] = ["lVal18AFC", "lVal18", "symbol", "Symbol"];
const COMPANY_NAME_KEYS: [&str; 5] = ["lVal30", "lSoc30", "lVal30AFC", "name", "Name"];

/// TSETMC CDN client that walks a list of mirrors for every request
pub struct TsetmcClient {
    client: Client,
    static_data_urls: Vec<String>,
    related_company_urls: Vec<String>,
}

impl TsetmcClient {
    /// Create a new TSETMC client
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json,text/plain,*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fa-IR,fa;q=0.9,en;q=0.8"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            static_data_urls: config.static_data_urls.clone(),
            related_company_urls: config.related_company_urls.clone(),
        })
    }

    /// Fetch a single URL and decode its body as JSON
    async fn fetch_json(&self, url: &str) -> Result<Value, RetrievalError> {
        debug!("Making request to: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| RetrievalError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // The CDN sometimes labels JSON as text/plain, so decode the text ourselves
        let body = response.text().await.map_err(|e| RetrievalError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let json: Value = serde_json::from_str(&body).map_err(|e| RetrievalError::MalformedPayload {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        debug!("API response received: {} bytes", body.len());

        if !json.is_object() {
            return Err(RetrievalError::MalformedPayload {
                url: url.to_string(),
                message: "expected a JSON object".to_string(),
            });
        }
        Ok(json)
    }

    /// Try each mirror once, in order; the first usable response wins
    async fn get_json(&self, urls: &[String]) -> Result<Value, RetrievalError> {
        let mut last_err = None;
        for url in urls {
            match self.fetch_json(url).await {
                Ok(json) => return Ok(json),
                Err(e) => {
                    warn!("Mirror {} failed: {}", url, e);
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(last) => Err(RetrievalError::AllMirrorsFailed { last: Box::new(last) }),
            None => Err(RetrievalError::NoMirrors),
        }
    }
}

#[async_trait::async_trait]
impl IndustryDataProvider for TsetmcClient {
    async fn list_industries(&self) -> Result<Vec<IndustryGroup>, RetrievalError> {
        let data = self.get_json(&self.static_data_urls).await?;
        let industries = parse_industry_groups(&data);
        debug!("Discovered {} industry groups", industries.len());
        Ok(industries)
    }

    async fn companies_for_industry(&self, code: &str) -> Result<Vec<Company>, RetrievalError> {
        let urls: Vec<String> = self
            .related_company_urls
            .iter()
            .map(|template| template.replace("{code}", code))
            .collect();
        let data = self.get_json(&urls).await?;
        let companies = parse_companies(&data);
        debug!("Retrieved {} companies for industry {}", companies.len(), code);
        Ok(companies)
    }
}

/// Array stored under either spelling of a key; anything else counts as empty
fn array_field<'a>(data: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .filter_map(|k| data.get(*k))
        .find_map(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Extract `IndustrialGroup` entries from a static-data document
pub fn parse_industry_groups(data: &Value) -> Vec<IndustryGroup> {
    let mut seen = HashSet::new();
    let mut industries = Vec::new();

    for item in array_field(data, &["staticData", "StaticData"]) {
        let Some(obj) = item.as_object() else { continue };

        let kind = first_key(obj, &["type", "Type"]).and_then(|v| v.as_str()).unwrap_or("");
        if kind != INDUSTRY_TYPE {
            continue;
        }

        let Some(code) = first_key(obj, &["code", "Code"]) else { continue };
        let code = pad_industry_code(&value_to_string(code));

        let name = first_key(obj, &INDUSTRY_NAME_KEYS)
            .map(value_to_string)
            .unwrap_or_else(|| format!("{}_{}", INDUSTRY_TYPE, code));
        let name = normalize_text(&name);

        if seen.insert(code.clone()) {
            industries.push(IndustryGroup { code, name });
        }
    }

    industries
}

/// Extract company rows from a related-company document
pub fn parse_companies(data: &Value) -> Vec<Company> {
    let mut seen = HashSet::new();
    let mut companies = Vec::new();

    for row in array_field(data, &["relatedCompany", "RelatedCompany"]) {
        let Some(row_obj) = row.as_object() else { continue };

        let instrument = row_obj
            .get("instrument")
            .filter(|v| !v.is_null())
            .or_else(|| row_obj.get("Instrument").filter(|v| !v.is_null()))
            .unwrap_or(row);
        let Some(instr) = instrument.as_object() else { continue };

        let (Some(id), Some(symbol)) = (
            first_key(instr, &COMPANY_ID_KEYS),
            first_key(instr, &COMPANY_SYMBOL_KEYS),
        ) else {
            continue;
        };

        let id = value_to_string(id).trim().to_string();
        let symbol = normalize_text(&value_to_string(symbol));
        let name = first_key(instr, &COMPANY_NAME_KEYS)
            .map(|v| normalize_text(&value_to_string(v)))
            .unwrap_or_default();

        if seen.insert(id.clone()) {
            companies.push(Company { id, symbol, name });
        }
    }

    companies
}
