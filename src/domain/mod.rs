// Alerting domain
pub mod alert;

// News articles
pub mod article;

// Article classification output
pub mod classification;

// Domain-specific error types
pub mod errors;

// The ten-factor market taxonomy
pub mod factors;

// Portfolio snapshot types
pub mod portfolio;

// Port interfaces
pub mod ports;

// Historical precedents
pub mod precedent;

// Supply-chain relationship graph types
pub mod relationship;

// Repository traits
pub mod repositories;
