use std::path::PathBuf;

use clap::Parser;

use crate::llm_client::GeminiModel;

#[derive(Debug, Parser)]
#[command(name = "scorer")]
#[command(about = "Score paper abstracts for civic-technology relevance with Gemini")]
#[command(version)]
#[command(after_help = "Authentication: GOOGLE_ACCESS_TOKEN is a static OAuth bearer token \
(e.g. `gcloud auth print-access-token`). It is not refreshed and typically expires after \
about one hour, which at the default 10s delay is roughly 360 rows. Longer runs fail \
with a 401 once it expires; split larger inputs into separate runs.")]
pub struct Cli {
    /// Input table; must have an `Abstract` column
    #[arg(short, long, default_value = "dataset_head_25.csv")]
    pub input: PathBuf,

    /// Output table: the input plus `Score` and `Reason` columns
    #[arg(short, long, default_value = "dataset_head_25_processed.csv")]
    pub output: PathBuf,

    /// Model id or alias (overrides GEMINI_MODEL)
    #[arg(short, long, value_parser = parse_model)]
    pub model: Option<GeminiModel>,

    /// Seconds to wait before each model call (overrides REQUEST_DELAY_SECS)
    #[arg(short, long)]
    pub delay_secs: Option<u64>,

    /// Field delimiter for both input and output ("tab" or "\t" for TSV)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

fn parse_model(s: &str) -> Result<GeminiModel, String> {
    s.parse()
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() && *b != b'"' && *b != b'\n' => Ok(*b),
            _ => Err(format!("delimiter must be a single ASCII character, got '{s}'")),
        },
    }
}
