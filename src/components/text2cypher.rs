use crate::fewshot::ExamplePair;
use crate::graph::{GraphError, GraphStore, Row};
use crate::llm::{CompletionError, CompletionService};
use crate::session::{Role, Turn};
use std::fmt::Write;
use std::sync::Arc;

/// Outcome of one translation attempt. `Translated` with empty `rows` means
/// the statement ran and matched nothing, which is not a failure.
#[derive(Debug)]
pub enum Translation {
    Translated {
        generated_cypher: String,
        rows: Vec<Row>,
    },
    Failed(TranslationFailure),
}

#[derive(Debug)]
pub enum TranslationFailure {
    /// The model produced no usable statement.
    EmptyStatement,
    /// The statement was produced but the store rejected or failed it.
    Execution(GraphError),
}

/// Translates a question (with conversation context and few-shot
/// demonstrations) into a Cypher statement and executes it.
pub struct Text2Cypher {
    llm: Arc<dyn CompletionService>,
    store: Arc<dyn GraphStore>,
    examples: &'static [ExamplePair],
}

impl Text2Cypher {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        store: Arc<dyn GraphStore>,
        examples: &'static [ExamplePair],
    ) -> Self {
        Self {
            llm,
            store,
            examples,
        }
    }

    /// Completion transport failures propagate as `Err`; everything the
    /// store or the model gets wrong is a `Translation::Failed`, so the
    /// caller has a single "nothing to summarize" branch.
    pub async fn run(
        &self,
        question: &str,
        history: &[Turn],
    ) -> Result<Translation, CompletionError> {
        let prompt = build_prompt(question, history, self.examples);
        let raw = self.llm.complete(&prompt).await?;

        let statement = match extract_cypher(&raw) {
            Some(statement) => statement,
            None => return Ok(Translation::Failed(TranslationFailure::EmptyStatement)),
        };

        tracing::debug!(cypher = %statement, "executing generated statement");
        match self.store.run(&statement).await {
            Ok(rows) => Ok(Translation::Translated {
                generated_cypher: statement,
                rows,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "generated statement failed to execute");
                Ok(Translation::Failed(TranslationFailure::Execution(err)))
            }
        }
    }
}

fn build_prompt(question: &str, history: &[Turn], examples: &[ExamplePair]) -> String {
    let mut prompt = String::from(
        "You translate questions about a graph database into Cypher statements.\n\
         Respond with a single Cypher statement and nothing else.\n\n",
    );

    for example in examples {
        let _ = write!(
            prompt,
            "Question: {}\nCypher: {}\n\n",
            example.question, example.query
        );
    }

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in history {
            let speaker = match turn.role {
                Role::User => "User",
                Role::System => "Assistant",
            };
            let _ = writeln!(prompt, "{}: {}", speaker, turn.content);
        }
        prompt.push('\n');
    }

    let _ = write!(prompt, "Question: {}\nCypher:", question);
    prompt
}

/// Pull the statement out of the completion, tolerating code fences and
/// chatter around the query. Returns `None` when nothing usable remains.
fn extract_cypher(raw: &str) -> Option<String> {
    let mut text = raw.trim();

    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let after = after.strip_prefix("cypher").unwrap_or(after);
        text = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
    }

    let statement = text.trim().trim_matches('`').trim();
    if statement.is_empty() {
        None
    } else {
        Some(statement.to_string())
    }
}
