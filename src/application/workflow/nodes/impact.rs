use crate::application::analysis::ImpactCalculator;
use crate::application::workflow::nodes::WorkflowNode;
use crate::application::workflow::state::{ImpactOutput, StatePatch, WorkflowState};
use crate::domain::alert::ReasoningStep;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

/// Stage 4: propagate each classified article's sentiment into the portfolio
/// through direct mentions and stored relationships, then aggregate.
pub struct ImpactNode {
    calculator: ImpactCalculator,
}

impl ImpactNode {
    pub fn new(calculator: ImpactCalculator) -> Self {
        Self { calculator }
    }
}

#[async_trait]
impl WorkflowNode for ImpactNode {
    fn name(&self) -> &'static str {
        "impact_calculator"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let mentions_by_article: HashMap<&str, &[String]> = state
            .articles()
            .iter()
            .map(|a| (a.id.as_str(), a.companies_mentioned.as_slice()))
            .collect();

        // Every article/relationship pair contributes its own record; the
        // aggregate is the mean over all of them and each one becomes a
        // reasoning step.
        let mut impacts = Vec::new();
        for classification in state.classifications() {
            let mentioned = mentions_by_article
                .get(classification.article_id.as_str())
                .copied()
                .unwrap_or(&[]);

            impacts.extend(
                self.calculator
                    .article_impacts(classification, mentioned, &state.portfolio)
                    .await?,
            );
        }

        let portfolio_impact = self.calculator.aggregate(&impacts, &state.portfolio);

        let reasoning_trail: Vec<ReasoningStep> = impacts
            .iter()
            .map(|record| ReasoningStep {
                ticker: record.ticker.clone(),
                level: record.level,
                reasoning: record.reason.clone(),
                confidence: record.confidence,
            })
            .collect();

        info!(
            "Impact calculation complete: {} records, portfolio {:+.2}%",
            impacts.len(),
            portfolio_impact.impact_pct
        );

        Ok(StatePatch {
            impact: Some(ImpactOutput {
                impacts,
                portfolio_impact,
                reasoning_trail,
            }),
            ..Default::default()
        })
    }
}
