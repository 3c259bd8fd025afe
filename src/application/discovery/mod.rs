pub mod extractor;
pub mod fusion;

pub use extractor::{DiscoveryOutcome, RelationshipExtractor};
