//! Project metadata for generating SonarQube analysis properties from
//! MSBuild projects.
//!
//! Everything here works on in-memory strings: callers read build files and
//! write properties files themselves.

pub mod msbuild;
pub mod project;
pub mod properties;

pub use msbuild::{ProjectReports, parse_project};
pub use project::{PathMatch, Project};
pub use properties::{PropertiesWriter, module_properties};
