pub mod parser;
pub mod pipeline;
pub mod prompts;

pub use pipeline::BatchAnnotator;
