use crate::graph::Row;
use crate::llm::{CompletionError, CompletionService, TokenStream};
use std::fmt::Write;
use std::sync::Arc;

/// Turns a bounded set of result rows into a streamed natural-language
/// answer. Callers are expected to have limited the rows already.
pub struct SummarizeResults {
    llm: Arc<dyn CompletionService>,
}

impl SummarizeResults {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    /// Open the streaming completion. The caller drives the stream, forwards
    /// each fragment, and concatenates the final answer; a mid-stream `Err`
    /// item means no complete answer exists.
    pub async fn stream(
        &self,
        question: &str,
        rows: &[Row],
    ) -> Result<TokenStream, CompletionError> {
        let prompt = build_prompt(question, rows);
        self.llm.stream(&prompt).await
    }
}

fn build_prompt(question: &str, rows: &[Row]) -> String {
    let mut prompt = String::from(
        "You answer questions using the results of a database query.\n\
         Answer in plain language, using only the information below.\n\n",
    );

    prompt.push_str("Results:\n");
    for row in rows {
        let _ = writeln!(
            prompt,
            "{}",
            serde_json::to_string(row).unwrap_or_default()
        );
    }
    if rows.is_empty() {
        prompt.push_str("(no rows)\n");
    }

    let _ = write!(prompt, "\nQuestion: {}\nAnswer:", question);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::Mutex;

    struct FragmentLlm {
        fragments: Vec<Result<String, CompletionError>>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionService for FragmentLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            unimplemented!("not used by the summarizer")
        }

        async fn stream(&self, prompt: &str) -> Result<TokenStream, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let items: Vec<_> = self
                .fragments
                .iter()
                .map(|f| match f {
                    Ok(s) => Ok(s.clone()),
                    Err(e) => Err(CompletionError::Stream(e.to_string())),
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    fn row(name: &str) -> Row {
        let mut row = Row::new();
        row.insert("o.name".to_string(), json!(name));
        row
    }

    #[tokio::test]
    async fn fragments_arrive_in_order() {
        let llm = Arc::new(FragmentLlm {
            fragments: vec![
                Ok("There ".to_string()),
                Ok("are ".to_string()),
                Ok("42.".to_string()),
            ],
            prompts: Mutex::new(Vec::new()),
        });
        let summarizer = SummarizeResults::new(llm);

        let mut stream = summarizer.stream("How many?", &[row("Neo4j")]).await.unwrap();
        let mut answer = String::new();
        let mut count = 0;
        while let Some(fragment) = stream.next().await {
            answer.push_str(&fragment.unwrap());
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(answer, "There are 42.");
    }

    #[tokio::test]
    async fn prompt_carries_question_and_every_row() {
        let llm = Arc::new(FragmentLlm {
            fragments: vec![Ok("ok".to_string())],
            prompts: Mutex::new(Vec::new()),
        });
        let summarizer = SummarizeResults::new(llm.clone());

        let rows = vec![row("Neo4j"), row("Siemens")];
        let _ = summarizer.stream("Who is there?", &rows).await.unwrap();

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Question: Who is there?"));
        assert!(prompts[0].contains("Neo4j"));
        assert!(prompts[0].contains("Siemens"));
    }

    #[test]
    fn empty_rows_are_stated_in_the_prompt() {
        let prompt = build_prompt("Anything?", &[]);
        assert!(prompt.contains("(no rows)"));
    }
}
