use crate::application::analysis::ConfidenceValidator;
use crate::application::workflow::nodes::WorkflowNode;
use crate::application::workflow::state::{StatePatch, WorkflowState};
use crate::domain::relationship::FusedRelationship;
use anyhow::Result;
use async_trait::async_trait;

/// Stage 5: the confidence gate. The only node whose output can send the
/// graph backwards.
pub struct ValidateNode {
    validator: ConfidenceValidator,
}

impl ValidateNode {
    pub fn new(validator: ConfidenceValidator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl WorkflowNode for ValidateNode {
    fn name(&self) -> &'static str {
        "confidence_validator"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let impacts = state
            .impact
            .as_ref()
            .map(|i| i.impacts.as_slice())
            .unwrap_or(&[]);

        let discovered: Vec<FusedRelationship> = state
            .discovered()
            .iter()
            .flat_map(|d| d.relationships.iter().cloned())
            .collect();

        let outcome = self.validator.validate(
            impacts,
            state.classifications(),
            &discovered,
            state.articles().len(),
            &state.portfolio.tickers(),
            state.loop_count,
        );

        Ok(StatePatch {
            validation: Some(outcome),
            ..Default::default()
        })
    }
}
