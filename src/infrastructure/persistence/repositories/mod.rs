pub mod agent_log_repository;
pub mod alert_repository;
pub mod article_repository;
pub mod company_repository;
pub mod holding_repository;
pub mod metadata_repository;
pub mod precedent_repository;
pub mod relationship_repository;

pub use agent_log_repository::SqliteAgentLogRepository;
pub use alert_repository::SqliteAlertRepository;
pub use article_repository::SqliteArticleRepository;
pub use company_repository::SqliteCompanyRepository;
pub use holding_repository::SqliteHoldingRepository;
pub use metadata_repository::SqliteMetadataRepository;
pub use precedent_repository::SqlitePrecedentRepository;
pub use relationship_repository::SqliteRelationshipRepository;
