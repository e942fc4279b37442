use std::fmt;
use std::str::FromStr;

/// Gemini models the scorer can be pointed at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    #[default]
    Flash20Lite,
    Flash20,
}

impl GeminiModel {
    pub const ALL: [GeminiModel; 2] = [GeminiModel::Flash20Lite, GeminiModel::Flash20];

    /// The publisher model id used in the Vertex AI request path.
    pub fn id(&self) -> &'static str {
        match self {
            GeminiModel::Flash20Lite => "gemini-2.0-flash-lite",
            GeminiModel::Flash20 => "gemini-2.0-flash-001",
        }
    }
}

impl fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GeminiModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini-2.0-flash-lite" | "flash-lite" => Ok(GeminiModel::Flash20Lite),
            "gemini-2.0-flash-001" | "gemini-2.0-flash" | "flash" => Ok(GeminiModel::Flash20),
            other => {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.id()).collect();
                Err(format!(
                    "unknown model '{other}' (expected one of: {})",
                    known.join(", ")
                ))
            }
        }
    }
}
