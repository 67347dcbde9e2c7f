use crate::graph::{GraphStore, Row};
use crate::llm::{CompletionError, CompletionService};
use std::fmt::Write;
use std::sync::Arc;

/// Proposes example questions a user could ask of the current database,
/// seeded with a small random sample of organization names.
pub struct QuestionProposalGenerator {
    llm: Arc<dyn CompletionService>,
    store: Arc<dyn GraphStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("could not sample the database: {0}")]
    Graph(#[from] crate::graph::GraphError),
}

impl QuestionProposalGenerator {
    pub fn new(llm: Arc<dyn CompletionService>, store: Arc<dyn GraphStore>) -> Self {
        Self { llm, store }
    }

    pub async fn run(&self) -> Result<Vec<String>, ProposalError> {
        let sample = self
            .store
            .run("MATCH (n:Organization) WITH n WHERE rand() < 0.01 RETURN n.name LIMIT 5")
            .await?;

        let prompt = build_prompt(&sample);
        let raw = self.llm.complete(&prompt).await?;
        Ok(parse_questions(&raw))
    }
}

fn build_prompt(sample: &[Row]) -> String {
    let mut prompt = String::from(
        "Propose five short questions a user could ask about a graph database of\n\
         organizations, their people, industries, suppliers and news mentions.\n\
         One question per line, no numbering.\n\nSome organizations in the database:\n",
    );
    for row in sample {
        if let Some(name) = row.get("n.name").and_then(|v| v.as_str()) {
            let _ = writeln!(prompt, "- {}", name);
        }
    }
    prompt
}

/// One proposal per line; tolerate numbering or bullets the model adds
/// anyway.
fn parse_questions(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == ')')
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
