//! Batch Annotator: scores every abstract in a table, one model call per row.
//!
//! Rows are processed strictly in order with a fixed pause before each call to
//! stay under the provider's rate limit. Results are collected in memory and
//! attached as `Score` / `Reason` only once every row has a result.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::annotation::parser::parse_score_result;
use crate::annotation::prompts::render_prompt;
use crate::errors::AppError;
use crate::llm_client::{LlmError, TextModel};
use crate::models::{ScoreResult, Table, ABSTRACT_COLUMN, REASON_COLUMN, SCORE_COLUMN};

pub struct BatchAnnotator {
    model: Arc<dyn TextModel>,
    delay: Duration,
}

impl BatchAnnotator {
    pub fn new(model: Arc<dyn TextModel>, delay: Duration) -> Self {
        Self { model, delay }
    }

    /// Scores one abstract. A reply that cannot be parsed gives an empty
    /// result; only a failed model call is an error.
    pub async fn annotate(&self, abstract_text: &str) -> Result<ScoreResult, LlmError> {
        let prompt = render_prompt(abstract_text);
        let raw = self.model.generate_text(&prompt).await?;
        info!("Model reply: {}", raw.trim());

        let result = parse_score_result(&raw);
        info!(
            "Parsed result: score={:?}, reason={:?}",
            result.score, result.reason
        );
        Ok(result)
    }

    /// Returns a copy of `table` with `Score` and `Reason` filled for every row.
    /// The first failed model call aborts the run and nothing is returned.
    pub async fn run_pipeline(&self, table: &Table) -> Result<Table, AppError> {
        let abstracts = table.column(ABSTRACT_COLUMN).ok_or(AppError::MissingColumn {
            column: ABSTRACT_COLUMN,
        })?;

        let total = table.len();
        info!(
            "Scoring {} rows with {} ({}s between calls)",
            total,
            self.model.model_id(),
            self.delay.as_secs_f64()
        );

        let mut scores = Vec::with_capacity(total);
        let mut reasons = Vec::with_capacity(total);
        let mut empty_results = 0;

        for (index, abstract_text) in abstracts.enumerate() {
            tokio::time::sleep(self.delay).await;
            info!("Processing row {}/{}", index + 1, total);

            let result = self
                .annotate(abstract_text)
                .await
                .map_err(|source| AppError::RemoteCall {
                    row: index + 1,
                    source,
                })?;

            if result.is_empty() {
                empty_results += 1;
            }
            scores.push(result.score_cell());
            reasons.push(result.reason_cell());
        }

        let mut output = table.clone();
        output.set_column(SCORE_COLUMN, scores);
        output.set_column(REASON_COLUMN, reasons);

        info!(
            "Scored {} rows ({} without a usable reply)",
            total, empty_results
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Replays canned replies in order and records every prompt it receives.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    fn ok(reply: &str) -> Result<String, LlmError> {
        Ok(reply.to_string())
    }

    fn papers(abstracts: &[&str]) -> Table {
        let mut table = Table::new(vec!["Id".to_string(), "Abstract".to_string()]);
        for (i, text) in abstracts.iter().enumerate() {
            table
                .push_row(vec![format!("p{}", i + 1), text.to_string()])
                .unwrap();
        }
        table
    }

    fn column(table: &Table, name: &str) -> Vec<String> {
        table.column(name).unwrap().map(str::to_string).collect()
    }

    const CIVIC: &str = "A city builds an open-data portal with a civic hackathon team.";
    const THEORY: &str = "A general survey of economic theory.";

    #[tokio::test(start_paused = true)]
    async fn test_scores_rows_in_order() {
        let model = ScriptedModel::new(vec![
            ok("```json\n{\"score\": 85, \"reason\": \"concrete civic project\"}\n```"),
            ok(r#"{"score": 5, "reason": "no case study"}"#),
        ]);
        let annotator = BatchAnnotator::new(model.clone(), Duration::from_secs(10));

        let output = annotator.run_pipeline(&papers(&[CIVIC, THEORY])).await.unwrap();

        assert_eq!(output.headers(), ["Id", "Abstract", "Score", "Reason"]);
        assert_eq!(column(&output, "Id"), vec!["p1", "p2"]);
        assert_eq!(column(&output, "Score"), vec!["85", "5"]);
        assert_eq!(
            column(&output, "Reason"),
            vec!["concrete civic project", "no case study"]
        );

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].ends_with(CIVIC));
        assert!(prompts[1].ends_with(THEORY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_reply_leaves_empty_cells_and_continues() {
        let model = ScriptedModel::new(vec![
            ok("Sorry, I cannot process this."),
            ok(r#"{"score": 5, "reason": "no case study"}"#),
        ]);
        let annotator = BatchAnnotator::new(model.clone(), Duration::from_secs(10));

        let output = annotator.run_pipeline(&papers(&[CIVIC, THEORY])).await.unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(column(&output, "Score"), vec!["", "5"]);
        assert_eq!(column(&output, "Reason"), vec!["", "no case study"]);
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_row_count_preserved_for_mixed_replies() {
        let abstracts = ["a", "b", "c", "d", "e"];
        let model = ScriptedModel::new(vec![
            ok(r#"{"score": 10, "reason": "r1"}"#),
            ok("{\"score\": 20,"),
            ok(""),
            ok("```json\n{\"reason\": \"only reason\"}\n```"),
            ok(r#"{"score": 50, "reason": "r5"}"#),
        ]);
        let annotator = BatchAnnotator::new(model, Duration::from_millis(1));

        let input = papers(&abstracts);
        let output = annotator.run_pipeline(&input).await.unwrap();

        assert_eq!(output.len(), input.len());
        assert_eq!(column(&output, "Id"), column(&input, "Id"));
        assert_eq!(column(&output, "Score"), vec!["10", "", "", "", "50"]);
        assert_eq!(column(&output, "Reason"), vec!["r1", "", "", "only reason", "r5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_failure_aborts_run() {
        let model = ScriptedModel::new(vec![
            ok(r#"{"score": 10, "reason": "r1"}"#),
            Err(LlmError::Api {
                status: 429,
                message: "Resource has been exhausted".to_string(),
            }),
            ok(r#"{"score": 30, "reason": "r3"}"#),
        ]);
        let annotator = BatchAnnotator::new(model.clone(), Duration::from_secs(10));

        let err = annotator
            .run_pipeline(&papers(&["a", "b", "c"]))
            .await
            .unwrap_err();

        match err {
            AppError::RemoteCall { row, source } => {
                assert_eq!(row, 2);
                assert!(matches!(source, LlmError::Api { status: 429, .. }));
            }
            other => panic!("expected RemoteCall, got {other:?}"),
        }
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_fixed_delay_before_every_call() {
        let model = ScriptedModel::new(vec![ok("{}"), ok("{}"), ok("{}")]);
        let annotator = BatchAnnotator::new(model, Duration::from_secs(10));

        let start = tokio::time::Instant::now();
        annotator.run_pipeline(&papers(&["a", "b", "c"])).await.unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(30), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(31), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_table_makes_no_calls() {
        let model = ScriptedModel::new(vec![]);
        let annotator = BatchAnnotator::new(model.clone(), Duration::from_secs(10));

        let output = annotator.run_pipeline(&papers(&[])).await.unwrap();

        assert!(output.is_empty());
        assert_eq!(output.headers(), ["Id", "Abstract", "Score", "Reason"]);
        assert!(model.prompts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_score_column_is_overwritten() {
        let mut table = Table::new(vec![
            "Abstract".to_string(),
            "Score".to_string(),
            "Notes".to_string(),
        ]);
        table
            .push_row(vec![CIVIC.to_string(), "old".to_string(), "keep".to_string()])
            .unwrap();
        let model = ScriptedModel::new(vec![ok(r#"{"score": 85, "reason": "civic"}"#)]);
        let annotator = BatchAnnotator::new(model, Duration::ZERO);

        let output = annotator.run_pipeline(&table).await.unwrap();

        assert_eq!(output.headers(), ["Abstract", "Score", "Notes", "Reason"]);
        assert_eq!(output.rows()[0], [CIVIC, "85", "keep", "civic"]);
    }

    #[tokio::test]
    async fn test_missing_abstract_column() {
        let table = Table::new(vec!["Title".to_string()]);
        let annotator = BatchAnnotator::new(ScriptedModel::new(vec![]), Duration::ZERO);
        let err = annotator.run_pipeline(&table).await.unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { column: "Abstract" }));
    }
}
