//! CSV export of fetched industries.
//!
//! Each industry gets its own `id,symbol,name` file under the output
//! directory, and every row is also appended to one combined
//! `industry,id,symbol,name` file in the same industry-then-company order.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::WriteError;
use crate::models::{
    CombinedRow, CompanyRow, Config, ExportSummary, Industry, COMBINED_HEADER, INDUSTRY_HEADER,
};
use crate::utils::slugify;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes per-industry CSV files and accumulates the combined file
pub struct Exporter {
    output_dir: PathBuf,
    combined_path: PathBuf,
    write_bom: bool,
    write_empty: bool,
    used_names: HashSet<String>,
    combined: Option<csv::Writer<File>>,
    summary: ExportSummary,
}

impl Exporter {
    pub fn new(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            combined_path: config.combined_csv_path.clone(),
            write_bom: config.write_utf8_bom,
            write_empty: config.write_empty,
            used_names: HashSet::new(),
            combined: None,
            summary: ExportSummary::default(),
        }
    }

    /// Write one industry's file and append its rows to the combined file.
    ///
    /// Returns the path written, or `None` when an empty industry was skipped.
    pub fn write_industry(&mut self, industry: &Industry) -> Result<Option<PathBuf>, WriteError> {
        if industry.is_empty() && !self.write_empty {
            debug!("Skipping industry {} ({}): no companies", industry.name, industry.code);
            return Ok(None);
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| WriteError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.next_industry_path(&industry.name);
        let mut writer = open_csv(&path, self.write_bom)?;
        write_header(&mut writer, &path, &INDUSTRY_HEADER)?;
        for company in &industry.companies {
            let row = CompanyRow {
                id: &company.id,
                symbol: &company.symbol,
                name: &company.name,
            };
            writer.serialize(row).map_err(|source| csv_error(&path, source))?;
        }
        writer.flush().map_err(|source| io_error(&path, source))?;

        self.append_combined(industry)?;

        self.summary.industries_written += 1;
        self.summary.total_rows += industry.companies.len();
        self.summary.industry_files.push(path.clone());
        Ok(Some(path))
    }

    /// Flush the combined file and return what was written
    pub fn finish(mut self) -> Result<ExportSummary, WriteError> {
        if self.combined.is_none() && self.write_empty {
            self.combined_writer()?;
        }

        if let Some(mut writer) = self.combined.take() {
            writer
                .flush()
                .map_err(|source| io_error(&self.combined_path, source))?;
            info!(
                "ALL -> {} | total: {}",
                self.combined_path.display(),
                self.summary.total_rows
            );
            self.summary.combined_file = Some(self.combined_path.clone());
        } else {
            info!("No companies collected.");
        }

        Ok(self.summary)
    }

    fn append_combined(&mut self, industry: &Industry) -> Result<(), WriteError> {
        if industry.is_empty() && self.combined.is_none() {
            return Ok(());
        }

        let path = self.combined_path.clone();
        let writer = self.combined_writer()?;
        for company in &industry.companies {
            let row = CombinedRow {
                industry: &industry.name,
                id: &company.id,
                symbol: &company.symbol,
                name: &company.name,
            };
            writer.serialize(row).map_err(|source| csv_error(&path, source))?;
        }
        writer.flush().map_err(|source| io_error(&path, source))
    }

    /// Combined writer, created with its header on first use
    fn combined_writer(&mut self) -> Result<&mut csv::Writer<File>, WriteError> {
        match self.combined {
            Some(ref mut writer) => Ok(writer),
            None => {
                if let Some(parent) = self.combined_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                let mut writer = open_csv(&self.combined_path, self.write_bom)?;
                write_header(&mut writer, &self.combined_path, &COMBINED_HEADER)?;
                Ok(self.combined.insert(writer))
            }
        }
    }

    /// `<slug>.csv`, suffixed `_2`, `_3`, ... when an earlier industry in this
    /// run already took the name. Files from previous runs are overwritten.
    fn next_industry_path(&mut self, industry_name: &str) -> PathBuf {
        let base = slugify(industry_name);
        let mut stem = base.clone();
        let mut i = 2;
        while self.used_names.contains(&stem) {
            stem = format!("{}_{}", base, i);
            i += 1;
        }
        self.used_names.insert(stem.clone());
        self.output_dir.join(format!("{}.csv", stem))
    }
}

/// Export an in-memory list of industries in one go
pub fn export_all(config: &Config, industries: &[Industry]) -> Result<ExportSummary, WriteError> {
    let mut exporter = Exporter::new(config);
    for industry in industries {
        exporter.write_industry(industry)?;
    }
    exporter.finish()
}

fn open_csv(path: &Path, write_bom: bool) -> Result<csv::Writer<File>, WriteError> {
    let mut file = File::create(path).map_err(|source| io_error(path, source))?;
    if write_bom {
        file.write_all(UTF8_BOM).map_err(|source| io_error(path, source))?;
    }
    Ok(csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file))
}

fn write_header(writer: &mut csv::Writer<File>, path: &Path, header: &[&str]) -> Result<(), WriteError> {
    writer.write_record(header).map_err(|source| csv_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> WriteError {
    WriteError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
