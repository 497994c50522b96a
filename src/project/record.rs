use std::sync::Arc;

use uuid::Uuid;

use super::paths::{self, PathMatch};

/// Metadata for one build project, as handed over by whatever discovered it.
///
/// Nothing is validated on construction. The record never changes afterwards,
/// so it can be shared freely between threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    name: String,
    id: Uuid,
    build_file_path: String,
    is_test: bool,
    files: Arc<[String]>,
    fxcop_report_path: Option<String>,
    coverage_report_path: Option<String>,
}

impl Project {
    /// `files` is stored as the handle given; pass a clone of an `Arc` to keep
    /// sharing the same list with the caller.
    pub fn new(
        name: impl Into<String>,
        id: Uuid,
        build_file_path: impl Into<String>,
        is_test: bool,
        files: impl Into<Arc<[String]>>,
        fxcop_report_path: Option<String>,
        coverage_report_path: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            build_file_path: build_file_path.into(),
            is_test,
            files: files.into(),
            fxcop_report_path,
            coverage_report_path,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn build_file_path(&self) -> &str {
        &self.build_file_path
    }

    pub fn is_test(&self) -> bool {
        self.is_test
    }

    pub fn files(&self) -> &Arc<[String]> {
        &self.files
    }

    pub fn fxcop_report_path(&self) -> Option<&str> {
        self.fxcop_report_path.as_deref()
    }

    pub fn coverage_report_path(&self) -> Option<&str> {
        self.coverage_report_path.as_deref()
    }

    /// Uppercase, hyphenated, no braces: `DB2E5521-3172-47B9-BA50-864F12E6DFFF`.
    pub fn id_as_string(&self) -> String {
        format!("{:X}", self.id.hyphenated())
    }

    /// Directory holding the build file, or `""` if the path has none.
    pub fn base_dir(&self) -> &str {
        paths::parent_dir(&self.build_file_path)
    }

    /// Files below [`Project::base_dir`], in their original order.
    pub fn files_in_base_dir(&self) -> Vec<&str> {
        self.files_in_base_dir_with(PathMatch::default())
    }

    pub fn files_in_base_dir_with(&self, matching: PathMatch) -> Vec<&str> {
        let base = self.base_dir();
        self.files
            .iter()
            .map(String::as_str)
            .filter(|file| paths::starts_with_dir(file, base, matching))
            .collect()
    }
}
