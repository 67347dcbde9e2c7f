use crate::llm::{CompletionError, CompletionService};
use std::sync::Arc;

/// Merges duplicate entities in extracted graph data (for example "Acme" and
/// "Acme Inc."). Runs after `DataExtractor` on the `/data2cypher` route.
pub struct DataDisambiguation {
    llm: Arc<dyn CompletionService>,
}

impl DataDisambiguation {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    pub async fn run(&self, extracted: &str) -> Result<String, CompletionError> {
        let prompt = format!(
            "The JSON below describes nodes and relationships extracted from text.\n\
             Merge nodes that refer to the same real-world entity, keeping one id\n\
             per entity and rewriting relationships to the surviving ids. Respond\n\
             with the corrected JSON only.\n\n{}",
            extracted
        );
        self.llm.complete(&prompt).await
    }
}
