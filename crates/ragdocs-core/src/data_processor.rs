use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Sliding window over whitespace tokens: `chunk_size` tokens per window,
/// consecutive windows share `overlap` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 150, overlap: 30 }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    /// The window must advance on every step or chunking never terminates.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Split `text` into overlapping windows of whitespace-delimited tokens.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    config.validate()?;
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + config.chunk_size).min(tokens.len());
        chunks.push(tokens[start..end].join(" "));
        start += config.stride();
    }
    Ok(chunks)
}

/// Read every page of a PDF and return the concatenated text.
///
/// Unreadable or unparsable files are logged and yield an empty string so that
/// one bad document does not abort a whole ingestion run.
pub fn extract_text_from_pdf(path: &Path) -> String {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read PDF");
            return String::new();
        }
    };
    match pdf_extract::extract_text_from_mem(&bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to extract PDF text");
            String::new()
        }
    }
}

/// `*.pdf` files directly inside `dir` (no recursion), sorted by path.
pub fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!("PDF directory {}", dir.display())));
    }
    let mut pdf_files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        let is_pdf = path.extension().and_then(|s| s.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf { pdf_files.push(path.to_path_buf()); }
    }
    pdf_files.sort();
    Ok(pdf_files)
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_chunking(chunking_config: ChunkingConfig) -> Result<Self> {
        chunking_config.validate()?;
        Ok(Self { chunking_config })
    }

    pub fn chunking_config(&self) -> &ChunkingConfig { &self.chunking_config }

    /// Extract and chunk every PDF in `pdf_dir`. Chunks are returned in file
    /// order, then position order, which is the id order of the index.
    pub fn process_directory(&self, pdf_dir: &Path) -> Result<Vec<Chunk>> {
        let files = list_pdf_files(pdf_dir)?;
        if files.is_empty() {
            warn!(dir = %pdf_dir.display(), "No .pdf files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            info!("Processing file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let text = extract_text_from_pdf(file_path);
            all_chunks.extend(self.chunk_document(&text, &source_name(file_path))?);
        }
        info!("Processed {} files into {} chunks", files.len(), all_chunks.len());
        Ok(all_chunks)
    }

    pub fn chunk_document(&self, text: &str, source: &str) -> Result<Vec<Chunk>> {
        let chunks = chunk_text(text, &self.chunking_config)?;
        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(position, text)| Chunk { text, source: source.to_string(), position })
            .collect())
    }
}

fn source_name(file_path: &Path) -> String {
    file_path.file_name().map_or_else(|| file_path.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string())
}
