// Prompt for the relevance scorer. The wording is business logic; only the
// JSON contract (`score`, `reason`) is relied on by the parser.

/// Relevance prompt. Replace `{abstract}` before sending.
pub const RELEVANCE_PROMPT_TEMPLATE: &str = r#"Evaluate this abstract of the paper and give this a score from 1 to 100 if it's related to Civic technology.
Civic technology is defined as physical or digital tools that connect citizens with governments or improve
public services or enhance community engagement. However, lower the score significantly if it doesn't
discuss a case study involving a team working on a software or hardware project.

Output in the JSON format with two fields score and reason. Keep the reason very short.

Abstract:
{abstract}"#;

const ABSTRACT_PLACEHOLDER: &str = "{abstract}";

/// Substitutes the abstract into the relevance template. Pure and deterministic.
pub fn render_prompt(abstract_text: &str) -> String {
    RELEVANCE_PROMPT_TEMPLATE.replace(ABSTRACT_PLACEHOLDER, abstract_text)
}
