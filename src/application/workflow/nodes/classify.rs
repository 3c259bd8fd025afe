use crate::application::analysis::Classifier;
use crate::application::workflow::nodes::WorkflowNode;
use crate::application::workflow::state::{ClassifyOutput, StatePatch, WorkflowState};
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Stage 2: attribute every fetched article to a market factor with signed
/// sentiment. Articles the classifier cannot parse degrade to its heuristic
/// inside [`Classifier`]; nothing is dropped here.
pub struct ClassifyNode {
    classifier: Classifier,
}

impl ClassifyNode {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl WorkflowNode for ClassifyNode {
    fn name(&self) -> &'static str {
        "classifier"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let mut classifications = Vec::new();
        for article in state.articles() {
            classifications.push(self.classifier.classify(article).await);
        }

        let high_priority: Vec<String> = classifications
            .iter()
            .filter(|c| c.is_high_priority())
            .map(|c| c.article_id.clone())
            .collect();

        info!(
            "Classified {} articles ({} high priority)",
            classifications.len(),
            high_priority.len()
        );

        Ok(StatePatch {
            classify: Some(ClassifyOutput {
                classifications,
                high_priority,
            }),
            ..Default::default()
        })
    }
}
