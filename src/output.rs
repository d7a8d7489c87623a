//! Result reports: console listing and html/csv/json files.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::result::ResultRecord;
use crate::util::sanitize_file_stem;
use crate::{Result, SearchError};

/// A report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Numbered listing on the console.
    Print,
    Html,
    Csv,
    Json,
}

impl OutputMode {
    /// Parses a comma-separated list such as `"print,json"`. Repeats are collapsed.
    pub fn parse_list(modes: &str) -> Result<Vec<OutputMode>> {
        let mut parsed = Vec::new();
        for token in modes.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let mode: OutputMode = token.parse()?;
            if !parsed.contains(&mode) {
                parsed.push(mode);
            }
        }
        Ok(parsed)
    }

    /// File extension, `None` for console output.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            OutputMode::Print => None,
            OutputMode::Html => Some("html"),
            OutputMode::Csv => Some("csv"),
            OutputMode::Json => Some("json"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "print" => Ok(OutputMode::Print),
            "html" => Ok(OutputMode::Html),
            "csv" => Ok(OutputMode::Csv),
            "json" => Ok(OutputMode::Json),
            other => Err(SearchError::InvalidConfig(format!(
                "Unknown output mode '{}' (expected print, html, csv or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputMode::Print => "print",
            OutputMode::Html => "html",
            OutputMode::Csv => "csv",
            OutputMode::Json => "json",
        };
        f.write_str(name)
    }
}

/// Context shared by all report formats.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub query: &'a str,
    pub engine: &'a str,
    pub records: &'a [ResultRecord],
}

#[derive(Serialize)]
struct JsonReport<'a> {
    query: &'a str,
    engine: &'a str,
    results: &'a [ResultRecord],
}

impl<'a> Report<'a> {
    pub fn new(query: &'a str, engine: &'a str, records: &'a [ResultRecord]) -> Self {
        Self {
            query,
            engine,
            records,
        }
    }

    /// Numbered plain-text listing.
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "Search results for \"{}\" on {} ({} results):\n\n",
            self.query,
            self.engine,
            self.records.len()
        );
        for (i, record) in self.records.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, record.title));
            out.push_str(&format!("   {}\n", record.link));
            if !record.snippet.is_empty() {
                out.push_str(&format!("   {}\n", record.snippet));
            }
            out.push('\n');
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut rows = String::new();
        for record in self.records {
            rows.push_str(&format!(
                "<tr><td>{}</td><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td></tr>\n",
                escape_html(self.engine),
                escape_html(&record.link),
                escape_html(&record.link),
                escape_html(&record.title),
                escape_html(&record.snippet),
            ));
        }
        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{q}</title></head>\n<body>\n\
             <h1>{q}</h1>\n<table>\n<tr><th>Engine</th><th>URL</th><th>Title</th><th>Text</th></tr>\n\
             {rows}</table>\n</body>\n</html>\n",
            q = escape_html(self.query),
            rows = rows
        )
    }

    /// One row per record: query, engine, domain, URL, title, text.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("query,engine,domain,URL,title,text\n");
        for record in self.records {
            let fields = [
                self.query,
                self.engine,
                record.host.as_str(),
                record.link.as_str(),
                record.title.as_str(),
                record.snippet.as_str(),
            ];
            let line: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        let report = JsonReport {
            query: self.query,
            engine: self.engine,
            results: self.records,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Writes every requested report. Console output goes to `console`;
    /// files land in `dir`, which is created if needed. Returns the files written.
    pub fn emit(
        &self,
        modes: &[OutputMode],
        dir: &Path,
        console: &mut dyn Write,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for mode in modes {
            let body = match mode {
                OutputMode::Print => {
                    console.write_all(self.to_text().as_bytes())?;
                    continue;
                }
                OutputMode::Html => self.to_html(),
                OutputMode::Csv => self.to_csv(),
                OutputMode::Json => self.to_json()?,
            };
            let path = output_path(dir, self.query, *mode);
            fs::create_dir_all(dir)?;
            fs::write(&path, body)?;
            info!("Wrote {} report to {}", mode, path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// `<dir>/<query words joined by _>.<ext>`
pub fn output_path(dir: &Path, query: &str, mode: OutputMode) -> PathBuf {
    let stem = sanitize_file_stem(query);
    match mode.extension() {
        Some(ext) => dir.join(format!("{}.{}", stem, ext)),
        None => dir.join(stem),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
