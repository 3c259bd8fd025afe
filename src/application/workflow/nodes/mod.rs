//! The seven workflow stages. Each node is a pure function from the current
//! state to a patch; side effects go through the injected repositories.

pub mod alert;
pub mod classify;
pub mod discover;
pub mod impact;
pub mod match_fast;
pub mod monitor;
pub mod validate;

use crate::application::workflow::state::{StatePatch, WorkflowState};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait WorkflowNode: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch>;
}

pub use alert::AlertNode;
pub use classify::ClassifyNode;
pub use discover::DiscoverNode;
pub use impact::ImpactNode;
pub use match_fast::MatchFastNode;
pub use monitor::MonitorNode;
pub use validate::ValidateNode;
