use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

/// One listed company inside an industry group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

impl Company {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Industry group as announced by the static-data endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndustryGroup {
    pub code: String,
    pub name: String,
}

/// An industry group together with the companies fetched for it, in fetch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Industry {
    pub code: String,
    pub name: String,
    pub companies: Vec<Company>,
}

impl Industry {
    pub fn new(group: IndustryGroup, companies: Vec<Company>) -> Self {
        Self {
            code: group.code,
            name: group.name,
            companies,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

/// Row of a per-industry CSV (`id,symbol,name`)
#[derive(Debug, Serialize)]
pub struct CompanyRow<'a> {
    pub id: &'a str,
    pub symbol: &'a str,
    pub name: &'a str,
}

/// Row of the combined CSV (`industry,id,symbol,name`)
#[derive(Debug, Serialize)]
pub struct CombinedRow<'a> {
    pub industry: &'a str,
    pub id: &'a str,
    pub symbol: &'a str,
    pub name: &'a str,
}

pub const INDUSTRY_HEADER: [&str; 3] = ["id", "symbol", "name"];
pub const COMBINED_HEADER: [&str; 4] = ["industry", "id", "symbol", "name"];

/// What to do when a single industry's company listing cannot be retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Stop the whole run at the first retrieval failure
    #[default]
    Abort,
    /// Log the failure, produce no file for that industry, keep going
    Skip,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" | "continue" => Ok(FailurePolicy::Skip),
            other => Err(anyhow::anyhow!("unknown failure policy: {}", other)),
        }
    }
}

pub const DEFAULT_STATIC_DATA_URLS: [&str; 2] = [
    "https://cdn.tsetmc.com/api/StaticData/GetStaticData",
    "http://cdn.tsetmc.com/api/StaticData/GetStaticData",
];

pub const DEFAULT_RELATED_COMPANY_URLS: [&str; 2] = [
    "https://cdn.tsetmc.com/api/ClosingPrice/GetRelatedCompany/{code}",
    "http://cdn.tsetmc.com/api/ClosingPrice/GetRelatedCompany/{code}",
];

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub static_data_urls: Vec<String>,
    /// Templates containing a `{code}` placeholder
    pub related_company_urls: Vec<String>,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub combined_csv_path: PathBuf,
    pub write_utf8_bom: bool,
    pub write_empty: bool,
    pub failure_policy: FailurePolicy,
    /// Restrict the run to these industry codes; empty means all
    pub industry_filter: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            static_data_urls: DEFAULT_STATIC_DATA_URLS.iter().map(|u| u.to_string()).collect(),
            related_company_urls: DEFAULT_RELATED_COMPANY_URLS.iter().map(|u| u.to_string()).collect(),
            request_timeout_secs: 30,
            output_dir: PathBuf::from("industries"),
            combined_csv_path: PathBuf::from("all_companies_with_industry.csv"),
            write_utf8_bom: true,
            write_empty: false,
            failure_policy: FailurePolicy::Abort,
            industry_filter: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();

        let config = Config {
            static_data_urls: env_list("TSETMC_STATIC_DATA_URLS")
                .unwrap_or(defaults.static_data_urls),
            related_company_urls: env_list("TSETMC_RELATED_COMPANY_URLS")
                .unwrap_or(defaults.related_company_urls),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            combined_csv_path: std::env::var("COMBINED_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.combined_csv_path),
            write_utf8_bom: env_bool("WRITE_UTF8_BOM").unwrap_or(defaults.write_utf8_bom),
            write_empty: env_bool("WRITE_EMPTY_INDUSTRIES").unwrap_or(defaults.write_empty),
            failure_policy: std::env::var("ON_FETCH_ERROR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.failure_policy),
            industry_filter: Vec::new(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that every mirror is a usable absolute URL
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.static_data_urls.is_empty() {
            return Err(anyhow::anyhow!("at least one static data URL is required"));
        }
        if self.related_company_urls.is_empty() {
            return Err(anyhow::anyhow!("at least one related company URL is required"));
        }
        for raw in self.static_data_urls.iter() {
            url::Url::parse(raw).map_err(|e| anyhow::anyhow!("invalid static data URL {}: {}", raw, e))?;
        }
        for template in self.related_company_urls.iter() {
            if !template.contains("{code}") {
                return Err(anyhow::anyhow!("related company URL must contain {{code}}: {}", template));
            }
            let probe = template.replace("{code}", "01");
            url::Url::parse(&probe)
                .map_err(|e| anyhow::anyhow!("invalid related company URL {}: {}", template, e))?;
        }
        Ok(())
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn env_bool(key: &str) -> Option<bool> {
    match std::env::var(key).ok()?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Outcome of writing the export files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub industries_written: usize,
    pub total_rows: usize,
    pub industry_files: Vec<PathBuf>,
    pub combined_file: Option<PathBuf>,
}

/// Outcome of a full fetch-and-export run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub industries_discovered: usize,
    pub industries_exported: usize,
    pub empty_industries: Vec<String>,
    pub failed_industries: Vec<String>,
    pub total_companies: usize,
    pub export: ExportSummary,
}
