use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::api::IndustryDataProvider;
use crate::error::PipelineError;
use crate::exporter::Exporter;
use crate::models::{Config, ExportSummary, FailurePolicy, Industry, IndustryGroup, RunReport};
use crate::utils::pad_industry_code;

/// Sequential fetch-and-export driver: one industry is fetched, written and
/// appended to the combined file before the next one is requested.
pub struct IndustryCollector<P> {
    provider: P,
    config: Config,
}

impl<P: IndustryDataProvider + Send + Sync> IndustryCollector<P> {
    /// Create a new industry collector
    pub fn new(provider: P, config: Config) -> Self {
        Self { provider, config }
    }

    /// Discover industry groups, applying the configured code filter
    pub async fn discover(&self) -> Result<Vec<IndustryGroup>, PipelineError> {
        info!("📋 Loading industry groups...");
        let groups = self
            .provider
            .list_industries()
            .await
            .map_err(PipelineError::Discovery)?;

        if self.config.industry_filter.is_empty() {
            return Ok(groups);
        }

        let wanted: Vec<String> = self
            .config
            .industry_filter
            .iter()
            .map(|code| pad_industry_code(code))
            .collect();
        let selected: Vec<IndustryGroup> = groups
            .into_iter()
            .filter(|group| wanted.contains(&group.code))
            .collect();
        debug!("Industry filter kept {} of the requested {} codes", selected.len(), wanted.len());
        Ok(selected)
    }

    /// Run the full pipeline and report what happened
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let groups = self.discover().await?;

        let mut report = RunReport {
            started_at,
            finished_at: started_at,
            industries_discovered: groups.len(),
            industries_exported: 0,
            empty_industries: Vec::new(),
            failed_industries: Vec::new(),
            total_companies: 0,
            export: ExportSummary::default(),
        };

        if groups.is_empty() {
            info!("No industries found.");
            report.finished_at = Utc::now();
            return Ok(report);
        }
        info!("✅ Found {} industry groups", groups.len());

        let total = groups.len();
        let mut exporter = Exporter::new(&self.config);

        for (idx, group) in groups.into_iter().enumerate() {
            let position = idx + 1;
            let code = group.code.clone();

            let companies = match self.provider.companies_for_industry(&code).await {
                Ok(companies) => companies,
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::Abort => {
                        error!("[{}/{}] {} ({}) failed: {}", position, total, group.name, code, e);
                        // keep whatever was already appended to the combined file
                        if let Err(write_err) = exporter.finish() {
                            error!("Failed to finish export after abort: {}", write_err);
                        }
                        return Err(PipelineError::Retrieval { code, source: e });
                    }
                    FailurePolicy::Skip => {
                        warn!("[{}/{}] {} ({}) skipped: {}", position, total, group.name, code, e);
                        report.failed_industries.push(code);
                        continue;
                    }
                },
            };

            let industry = Industry::new(group, companies);
            let count = industry.companies.len();

            match exporter.write_industry(&industry)? {
                Some(path) => {
                    info!(
                        "[{}/{}] {} ({}) -> {} | {}",
                        position,
                        total,
                        industry.name,
                        industry.code,
                        count,
                        path.display()
                    );
                    report.industries_exported += 1;
                    report.total_companies += count;
                }
                None => {
                    debug!("[{}/{}] {} ({}) has no companies", position, total, industry.name, industry.code);
                }
            }
            if industry.is_empty() {
                report.empty_industries.push(industry.code);
            }
        }

        report.export = exporter.finish()?;
        report.finished_at = Utc::now();

        info!(
            "🎉 Exported {} industries, {} companies in {}s",
            report.industries_exported,
            report.total_companies,
            (report.finished_at - report.started_at).num_seconds()
        );
        Ok(report)
    }
}
