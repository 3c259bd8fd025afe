pub mod edgar;
pub mod llm;
pub mod news;
pub mod persistence;

pub use persistence::Database;
