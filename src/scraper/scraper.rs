// scraper.rs
use crate::errors::{AppError, Result};
use crate::scraper::models::ScrapedRow;
use std::path::PathBuf;
use std::process::Command;

/// Produces the rows of one scrape. The scraping itself happens elsewhere.
pub trait ListingSource {
    fn fetch(&self) -> Result<Vec<ScrapedRow>>;
}

/// Rows exported by the scraper as a JSON array on disk.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ListingSource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<ScrapedRow>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::scraper(format!("cannot read {}: {e}", self.path.display()))
        })?;
        parse_rows(&text)
    }
}

/// Runs the scraper program and reads a JSON array from its stdout.
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    /// `argv[0]` is the program, the rest are its arguments.
    pub fn new(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| AppError::config("ingest.command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl ListingSource for CommandSource {
    fn fetch(&self) -> Result<Vec<ScrapedRow>> {
        log::info!("🧵 Running scraper: {} {}", self.program, self.args.join(" "));

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| AppError::scraper(format!("cannot start {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::scraper(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_rows(&stdout)
    }
}

/// Parses a scraper export. Blank output means "nothing scraped".
///
/// Only a broken array is an error; a single unreadable row comes back
/// as a rejected placeholder.
pub fn parse_rows(text: &str) -> Result<Vec<ScrapedRow>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let values: Vec<serde_json::Value> = serde_json::from_str(text)?;

    let rows = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Unreadable scraped row #{i}: {e}");
                ScrapedRow::rejected(format!("Unreadable row #{i}: {e}"))
            })
        })
        .collect();
    Ok(rows)
}
