//! CSV export of the month history.
//!
//! One row per month in chronological order, plain decimal numbers with two
//! places and no currency symbol, suitable for a spreadsheet import.

use anyhow::Result;
use chrono::Utc;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::money;
use crate::domain::summary_service::summarize_record;
use crate::storage::{Connection, MonthStorage};

const CSV_HEADER: [&str; 7] = [
    "Month",
    "Income",
    "Expenses",
    "MonthlyRecurring",
    "YearlyDue",
    "Investments",
    "Savings",
];

/// A generated export, ready to hand to the host for download or saving.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub csv_content: String,
    pub filename: String,
    pub month_count: usize,
}

#[derive(Clone)]
pub struct ExportService<C: Connection> {
    month_repository: C::MonthRepository,
}

impl<C: Connection> ExportService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            month_repository: connection.create_month_repository(),
        }
    }

    /// Render every stored month as CSV.
    pub fn export_csv(&self) -> Result<CsvExport> {
        let mut months = self.month_repository.list_months()?;
        months.sort_by_key(|m| m.id);

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;
        for record in &months {
            let summary = summarize_record(record);
            let investments_total = money::from_cents(
                record
                    .investments
                    .values()
                    .map(|amount| money::to_cents(*amount))
                    .sum(),
            );
            writer.write_record(&[
                record.id.to_string(),
                format!("{:.2}", summary.total_income),
                format!("{:.2}", summary.daily_total),
                format!("{:.2}", summary.monthly_recurring_total),
                format!("{:.2}", summary.yearly_due_this_month),
                format!("{:.2}", investments_total),
                format!("{:.2}", summary.actual_savings),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Flushing CSV writer failed: {}", e.error()))?;
        let csv_content = String::from_utf8(bytes)?;
        let filename = format!("smartfinance_{}.csv", Utc::now().format("%Y%m%d"));
        info!(
            "Exported {} month(s) as CSV ({} bytes)",
            months.len(),
            csv_content.len()
        );
        Ok(CsvExport {
            csv_content,
            filename,
            month_count: months.len(),
        })
    }

    /// Write the export to `custom_path` (a directory), or to the user's
    /// documents directory when none is given. Returns the file written.
    pub fn export_to_path(&self, custom_path: Option<&Path>) -> Result<PathBuf> {
        let export = self.export_csv()?;

        let export_dir = match custom_path {
            Some(path) => path.to_path_buf(),
            None => dirs::document_dir()
                .or_else(dirs::home_dir)
                .ok_or_else(|| anyhow::anyhow!("Could not determine an export directory"))?,
        };
        fs::create_dir_all(&export_dir)?;

        let file_path = export_dir.join(&export.filename);
        fs::write(&file_path, &export.csv_content)?;
        info!(
            "Exported {} month(s) to {}",
            export.month_count,
            file_path.display()
        );
        Ok(file_path)
    }
}
