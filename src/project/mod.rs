pub mod paths;
mod record;

pub use paths::PathMatch;
pub use record::Project;
