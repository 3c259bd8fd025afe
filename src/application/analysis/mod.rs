pub mod classifier;
pub mod impact;
pub mod validator;

pub use classifier::Classifier;
pub use impact::{CriticalityMultipliers, ImpactCalculator, TierMultipliers};
pub use validator::{ConfidenceValidator, ValidationDecision, ValidationOutcome};
