mod cache;
mod orchestrator;
mod profile;
mod result;

pub use cache::ReferenceCache;
pub use orchestrator::ComparisonEngine;
pub use profile::SequenceProfile;
pub use result::ComparisonResult;
