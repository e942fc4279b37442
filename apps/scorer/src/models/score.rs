/// Parsed model verdict for one abstract. Both fields are `None` when the reply
/// could not be parsed, so every row still yields a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreResult {
    /// Relevance on the 1–100 scale the prompt asks for. Not range-checked.
    pub score: Option<i64>,
    pub reason: Option<String>,
}

impl ScoreResult {
    #[cfg(test)]
    pub fn new(score: i64, reason: impl Into<String>) -> Self {
        Self {
            score: Some(score),
            reason: Some(reason.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.score.is_none() && self.reason.is_none()
    }

    /// Cell text for the `Score` column; empty when absent.
    pub fn score_cell(&self) -> String {
        self.score.map(|s| s.to_string()).unwrap_or_default()
    }

    /// Cell text for the `Reason` column; empty when absent.
    pub fn reason_cell(&self) -> String {
        self.reason.clone().unwrap_or_default()
    }
}
