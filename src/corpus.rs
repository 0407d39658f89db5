//! Corpus scanning and the in-memory annotated file model.
use crate::normalize::normalize_lines;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const TEST_FILE_EXTENSION: &str = "zig";

/// A test-definition file held as newline-preserving lines.
#[derive(Debug, Clone)]
pub struct AnnotatedFile {
    pub path: PathBuf,
    lines: Vec<String>,
    dirty: bool,
}

impl AnnotatedFile {
    /// Build a file from raw text, normalizing its markers.
    pub fn from_text(path: PathBuf, text: &str) -> Self {
        let original = split_lines(text);
        let lines = normalize_lines(&original);
        let dirty = lines != original;
        Self { path, lines, dirty }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Ok(Self::from_text(path.to_path_buf(), &text))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether the buffer differs from what is on disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn text(&self) -> String {
        self.lines.concat()
    }

    /// Replace the buffer; only the reconciler calls this.
    pub(crate) fn replace_lines(&mut self, lines: Vec<String>) {
        if lines != self.lines {
            self.lines = lines;
            self.dirty = true;
        }
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// The buffer without line `skip`, as handed to the executor.
    pub fn text_without_line(&self, skip: usize) -> String {
        self.lines
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != skip)
            .map(|(_, line)| line.as_str())
            .collect()
    }
}

/// Split text into lines that keep their terminating newline.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Resolve `target` (a file or directory) into the files to process.
pub fn discover(target: &Path) -> Result<Vec<PathBuf>> {
    if target.is_file() {
        return Ok(vec![target.to_path_buf()]);
    }
    if !target.is_dir() {
        return Err(anyhow!("test path {} does not exist", target.display()));
    }
    collect_test_files(target)
}

fn collect_test_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_test_files(&path)?);
        } else if path.is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(TEST_FILE_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load and normalize every file under `target`.
///
/// Files that are not UTF-8 text are skipped rather than failing the run.
pub fn load_corpus(target: &Path) -> Result<Vec<AnnotatedFile>> {
    let mut corpus = Vec::new();
    for path in discover(target)? {
        match AnnotatedFile::load(&path) {
            Ok(file) => {
                tracing::debug!(
                    path = %path.display(),
                    lines = file.lines().len(),
                    normalized = file.is_dirty(),
                    "loaded test file"
                );
                corpus.push(file);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
            }
        }
    }
    Ok(corpus)
}
