//! Extraction batch: run the document extractor over one PDF or a
//! directory of PDFs and collect a field map per file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{ExtractionError, PipelineError};
use crate::models::FieldMap;

/// Marker recorded for a single input file that is not a PDF.
pub const NOT_A_PDF: &str = "Not a PDF file";

/// Turns one PDF into a field map. Implemented by the extraction service
/// client; tests use a canned mock.
pub trait DocumentExtractor {
    fn extract(&self, pdf_path: &Path) -> Result<FieldMap, ExtractionError>;
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn extract_one(extractor: &dyn DocumentExtractor, path: &Path) -> FieldMap {
    match extractor.extract(path) {
        Ok(fields) => {
            tracing::info!(file = %path.display(), fields = fields.len(), "Extraction complete");
            fields
        }
        Err(e) => {
            tracing::error!(file = %path.display(), error = %e, "Extraction failed");
            FieldMap::failed(e.to_string())
        }
    }
}

/// Extract a single PDF or every PDF directly inside a directory.
///
/// Results are keyed by file name. A per-file failure becomes that file's
/// error marker; only a missing input path is an error.
pub fn process_input(
    extractor: &dyn DocumentExtractor,
    input: &Path,
) -> Result<BTreeMap<String, FieldMap>, PipelineError> {
    let mut results = BTreeMap::new();

    if input.is_file() {
        let name = file_name(input);
        if is_pdf(input) {
            results.insert(name, extract_one(extractor, input));
        } else {
            tracing::warn!(file = %input.display(), "Skipping non-PDF file");
            results.insert(name, FieldMap::failed(NOT_A_PDF));
        }
    } else if input.is_dir() {
        let mut pdfs: Vec<PathBuf> = std::fs::read_dir(input)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_pdf(p))
            .collect();
        pdfs.sort();
        tracing::info!(dir = %input.display(), count = pdfs.len(), "Found PDF files");

        for pdf in &pdfs {
            results.insert(file_name(pdf), extract_one(extractor, pdf));
        }
    } else {
        return Err(PipelineError::InputNotFound(input.to_path_buf()));
    }

    Ok(results)
}

/// Counts over an extraction batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub total: usize,
    pub successful: usize,
    /// (file, error marker) for every failed document.
    pub failed: Vec<(String, String)>,
}

impl ExtractionSummary {
    pub fn from_results(results: &BTreeMap<String, FieldMap>) -> Self {
        let failed: Vec<(String, String)> = results
            .iter()
            .filter_map(|(name, fields)| fields.error().map(|e| (name.clone(), e.to_string())))
            .collect();
        Self {
            total: results.len(),
            successful: results.len() - failed.len(),
            failed,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            total = self.total,
            successful = self.successful,
            failed = self.failed.len(),
            "Extraction batch complete"
        );
        for (file, error) in &self.failed {
            tracing::warn!(file = %file, error = %error, "Failed extraction");
        }
    }
}

pub fn timestamped_results_name() -> String {
    format!(
        "extraction_results_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

pub fn save_extraction_results(
    results: &BTreeMap<String, FieldMap>,
    path: &Path,
) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json.as_bytes())?;
    tracing::info!(path = %path.display(), documents = results.len(), "Results saved");
    Ok(())
}

pub fn load_extraction_results(path: &Path) -> Result<BTreeMap<String, FieldMap>, PipelineError> {
    let raw = std::fs::read_to_string(path)?;
    let results: BTreeMap<String, FieldMap> = serde_json::from_str(&raw)?;
    tracing::info!(path = %path.display(), documents = results.len(), "Results loaded");
    Ok(results)
}
