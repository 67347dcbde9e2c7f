use crate::llm::{CompletionError, CompletionService};
use std::sync::Arc;

/// One-shot extraction of graph-shaped entities and relationships from free
/// text. Not conversational; used by the `/data2cypher` route.
pub struct DataExtractor {
    llm: Arc<dyn CompletionService>,
}

impl DataExtractor {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    pub async fn run(&self, data: &str) -> Result<String, CompletionError> {
        self.llm.complete(&build_prompt(data, None)).await
    }

    /// Schema-guided variant: the caller supplies node labels and
    /// relationship types the output must stick to.
    pub async fn run_with_schema(
        &self,
        schema: &str,
        data: &str,
    ) -> Result<String, CompletionError> {
        self.llm.complete(&build_prompt(data, Some(schema))).await
    }
}

fn build_prompt(data: &str, schema: Option<&str>) -> String {
    let mut prompt = String::from(
        "Extract the entities and relationships from the text below as JSON with\n\
         \"nodes\" (id, label, properties) and \"relationships\" (start, end, type,\n\
         properties). Respond with JSON only.\n\n",
    );
    if let Some(schema) = schema {
        prompt.push_str("Use only the labels and relationship types in this schema:\n");
        prompt.push_str(schema);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Text:\n");
    prompt.push_str(data);
    prompt
}
