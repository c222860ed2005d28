//! Benchmark descriptor discovery and loading
//!
//! A descriptor is a plain text file with six newline-delimited fields in a
//! fixed order: identifier, display name, family, LTL formula, comma-separated
//! input variables and comma-separated output variables. The identifier
//! written inside the file must match the identifier derived from the file
//! name; a mismatch means the corpus is corrupt and is never recovered from.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Error type for loader operations
#[derive(Error, Debug)]
pub enum LoaderError {
    /// IO error when reading files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Walk directory error
    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),
    /// Identifier inside the descriptor differs from the one derived from its name
    #[error("Descriptor mismatch: expected id '{expected}', file declares '{found}'")]
    DescriptorMismatch {
        /// Identifier derived from the storage key
        expected: String,
        /// Identifier found on the first line
        found: String,
    },
    /// Descriptor path has no usable file stem
    #[error("Invalid descriptor path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Identity and problem statement of one benchmark instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkDescriptor {
    /// Identifier, unique within a corpus
    pub id: String,
    /// Display name
    pub name: String,
    /// Benchmark family (e.g. arbiter, mux)
    pub family: String,
    /// LTL formula in the tools' textual syntax
    pub ltl_formula: String,
    /// Input (environment) variables, in declaration order
    pub input_vars: Vec<String>,
    /// Output (system) variables, in declaration order
    pub output_vars: Vec<String>,
}

impl BenchmarkDescriptor {
    /// Parse descriptor text, checking the declared id against `expected_id`.
    ///
    /// Lines missing at the end of the text read as empty fields.
    pub fn parse(content: &str, expected_id: &str) -> LoaderResult<Self> {
        let mut lines = content.lines().map(str::trim);
        let mut next = || lines.next().unwrap_or_default().to_string();

        let id = next();
        if id != expected_id {
            return Err(LoaderError::DescriptorMismatch {
                expected: expected_id.to_string(),
                found: id,
            });
        }

        let name = next();
        let family = next();
        let ltl_formula = next();
        let input_vars = split_vars(&next());
        let output_vars = split_vars(&next());

        Ok(Self {
            id,
            name,
            family,
            ltl_formula,
            input_vars,
            output_vars,
        })
    }

    /// Inputs joined back into their on-disk comma form
    #[must_use]
    pub fn inputs_joined(&self) -> String {
        self.input_vars.join(",")
    }

    /// Outputs joined back into their on-disk comma form
    #[must_use]
    pub fn outputs_joined(&self) -> String {
        self.output_vars.join(",")
    }

    /// Whether `name` is one of the declared output variables
    #[must_use]
    pub fn is_output(&self, name: &str) -> bool {
        self.output_vars.iter().any(|v| v == name)
    }
}

/// Split a comma-separated variable list, dropping blanks
fn split_vars(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration for the descriptor loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory holding the descriptor files
    pub root_dir: PathBuf,
    /// File extension of descriptors (default: "txt")
    pub extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            extension: "txt".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Create a new config with the given root directory
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// Set the extension filter
    #[must_use]
    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into().trim_start_matches('.').to_string();
        self
    }
}

/// Loader for benchmark descriptor corpora
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    /// Create a new loader with the given configuration
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Create a loader with default configuration for the given directory
    #[must_use]
    pub fn for_directory(dir: impl Into<PathBuf>) -> Self {
        Self::new(LoaderConfig::new(dir))
    }

    /// List descriptor files directly under the root directory, ordered by id
    pub fn discover(&self) -> LoaderResult<Vec<PathBuf>> {
        let mut found = Vec::new();

        for entry in WalkDir::new(&self.config.root_dir).max_depth(1) {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            if path
                .extension()
                .is_none_or(|ext| ext != self.config.extension.as_str())
            {
                continue;
            }

            found.push(path.to_path_buf());
        }

        found.sort_by(|a, b| compare_ids(&stem_of(a), &stem_of(b)));
        debug!(
            "Discovered {} descriptors in {}",
            found.len(),
            self.config.root_dir.display()
        );

        Ok(found)
    }

    /// Load a descriptor, deriving the expected id from the file stem
    pub fn load(&self, path: impl AsRef<Path>) -> LoaderResult<BenchmarkDescriptor> {
        let path = path.as_ref();
        let id = Self::id_from_path(path)?;
        self.load_with_id(path, &id)
    }

    /// Load a descriptor, checking it against an externally derived id
    pub fn load_with_id(
        &self,
        path: impl AsRef<Path>,
        expected_id: &str,
    ) -> LoaderResult<BenchmarkDescriptor> {
        let content = fs::read_to_string(path.as_ref())?;
        BenchmarkDescriptor::parse(&content, expected_id)
    }

    /// Identifier of a descriptor, taken from its file stem
    pub fn id_from_path(path: &Path) -> LoaderResult<String> {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LoaderError::InvalidPath(path.to_path_buf()))
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Order ids numerically when both are integers, lexically otherwise
pub(crate) fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
