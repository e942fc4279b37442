pub mod score;
pub mod table;

pub use score::ScoreResult;
pub use table::{RowWidthError, Table};

/// Column holding the text sent to the model.
pub const ABSTRACT_COLUMN: &str = "Abstract";
/// Output column for the parsed relevance score.
pub const SCORE_COLUMN: &str = "Score";
/// Output column for the model's short justification.
pub const REASON_COLUMN: &str = "Reason";
