//! Detection tables shared by the prompt rules.
//!
//! Every keyword list and regex used to recognize personas, output formats,
//! few-shot examples, leftover TODOs and prompting techniques lives here, so
//! a table can be extended without touching any rule's control flow.
//! Portuguese and English phrasings are both recognized.

use lazy_static::lazy_static;
use regex::Regex;

/// Keywords showing the prompt pins down an output format.
/// Matched as substrings of the lower-cased system prompt.
pub const FORMAT_KEYWORDS: &[&str] = &[
    "markdown",
    "user story",
    "format",
    "template",
    "structure",
    "formato",
    "estrutura",
    "padrão",
    "como um",
    "eu quero",
    "para que",
];

/// Keywords suggesting the prompt embeds worked examples.
/// Matched as substrings of the lower-cased system prompt.
pub const EXAMPLE_KEYWORDS: &[&str] = &[
    "example",
    "exemplo",
    "input",
    "output",
    "entrada",
    "saída",
    "sample",
    "use case",
    "caso de uso",
];

/// Tags that describe where a prompt came from, never how it was written.
pub const NON_TECHNIQUE_TAGS: &[&str] = &["langsmith", "pull", "pulled"];

lazy_static! {
    // =========================================================================
    // PERSONA
    // =========================================================================

    /// Role declarations ("You are a...", "Você é um...", "Act as...").
    pub static ref PERSONA_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("you are", Regex::new(r"(?i)\byou are (a|an|the)\s+\S").unwrap()),
        ("act as", Regex::new(r"(?i)\bact as\s+\S").unwrap()),
        ("você é", Regex::new(r"(?i)\bvocê é (um|uma|o|a)\s+\S").unwrap()),
        ("atue como", Regex::new(r"(?i)\batue como\s+\S").unwrap()),
        ("be", Regex::new(r"(?im)^\s*(be|seja)\s+\S").unwrap()),
    ];

    // =========================================================================
    // FEW-SHOT
    // =========================================================================

    /// Labelled example input ("Input:", "Entrada:").
    pub static ref INPUT_LABEL: Regex = Regex::new(r"(?i)\b(input|entrada)\s*:").unwrap();

    /// Labelled example output ("Output:", "Saída:").
    pub static ref OUTPUT_LABEL: Regex = Regex::new(r"(?i)\b(output|saída)\s*:").unwrap();

    /// Numbered examples ("Example 1", "Exemplo 2").
    pub static ref NUMBERED_EXAMPLE: Regex = Regex::new(r"(?i)\b(example|exemplo)\s+\d+").unwrap();

    // =========================================================================
    // UNRESOLVED PLACEHOLDERS
    // =========================================================================

    /// "[TODO]" or "TODO:" in any letter case.
    pub static ref TODO_MARKER: Regex = Regex::new(r"(?i)\[todo\]|todo:").unwrap();

    // =========================================================================
    // TECHNIQUES
    // =========================================================================

    /// Techniques named explicitly in the prompt text.
    pub static ref TECHNIQUE_KEYWORDS: Vec<(&'static str, Regex)> = vec![
        ("few-shot", Regex::new(r"(?i)few[- ]shot").unwrap()),
        ("chain-of-thought", Regex::new(r"(?i)chain[- ]of[- ]thought|\bcot\b").unwrap()),
        ("role-playing", Regex::new(r"(?i)role[- ]playing|\bpersona\b").unwrap()),
        ("zero-shot", Regex::new(r"(?i)zero[- ]shot").unwrap()),
        ("self-consistency", Regex::new(r"(?i)self[- ]consistency").unwrap()),
        ("tree-of-thoughts", Regex::new(r"(?i)tree[- ]of[- ]thoughts?").unwrap()),
        ("prompt-chaining", Regex::new(r"(?i)prompt[- ]chaining").unwrap()),
        ("output-format", Regex::new(r"(?i)output format|formato").unwrap()),
        ("step-by-step", Regex::new(r"(?i)step[- ]by[- ]step|passo a passo").unwrap()),
    ];

    /// Techniques implied by how the prompt is written. Only consulted for
    /// labels the keyword table did not already find.
    pub static ref TECHNIQUE_INFERENCE: Vec<(&'static str, Regex)> = vec![
        ("role-playing", Regex::new(r"(?i)\b(você é (um|uma|o|a)|you are (a|an|the))\s+\S").unwrap()),
        ("output-format", Regex::new(r"(?i)formato|estrutura|template|padrão|user story").unwrap()),
        ("task-decomposition", Regex::new(r"(?i)an[aá]lise|process").unwrap()),
        ("step-by-step", Regex::new(r"(?i)\b(passo|step)\s+\d+|processo").unwrap()),
        ("few-shot", Regex::new(r"(?i)exemplo|example|entrada|saída").unwrap()),
    ];
}

/// Name of the first persona pattern found in `text`.
pub fn find_persona(text: &str) -> Option<&'static str> {
    PERSONA_PATTERNS
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map(|(name, _)| *name)
}

/// Whether `text` contains any of `keywords`, ignoring case.
pub fn contains_any_keyword(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|keyword| lower.contains(keyword))
}

/// Whether `text` has both a labelled input and a labelled output.
pub fn has_labelled_example(text: &str) -> bool {
    INPUT_LABEL.is_match(text) && OUTPUT_LABEL.is_match(text)
}

/// Whether `text` contains a numbered example heading.
pub fn has_numbered_example(text: &str) -> bool {
    NUMBERED_EXAMPLE.is_match(text)
}

/// Every TODO marker found in `text`, as written.
pub fn find_todos(text: &str) -> Vec<&str> {
    TODO_MARKER.find_iter(text).map(|m| m.as_str()).collect()
}

/// Whether a tag names a technique rather than the prompt's provenance.
pub fn is_technique_tag(tag: &str) -> bool {
    let tag = tag.trim();
    !tag.is_empty()
        && !NON_TECHNIQUE_TAGS
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(tag))
}

/// Techniques detected in `text`: explicit keywords first, then inference
/// for anything the keywords missed. Each label appears once.
pub fn detect_techniques(text: &str) -> Vec<&'static str> {
    let mut found: Vec<&'static str> = TECHNIQUE_KEYWORDS
        .iter()
        .filter(|(_, regex)| regex.is_match(text))
        .map(|(label, _)| *label)
        .collect();

    for (label, regex) in TECHNIQUE_INFERENCE.iter() {
        if !found.contains(label) && regex.is_match(text) {
            found.push(label);
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_detection() {
        assert_eq!(find_persona("You are a senior product manager."), Some("you are"));
        assert_eq!(find_persona("Você é uma analista de QA."), Some("você é"));
        assert_eq!(find_persona("VOCÊ É O responsável."), Some("você é"));
        assert_eq!(find_persona("Please act as a reviewer"), Some("act as"));
        assert_eq!(find_persona("Atue como Product Owner"), Some("atue como"));
        assert_eq!(find_persona("Intro\nBe concise and direct."), Some("be"));
        assert_eq!(find_persona("Seja objetivo."), Some("be"));
        assert_eq!(find_persona("Convert the bug into a story."), None);
    }

    #[test]
    fn test_be_persona_only_at_line_start() {
        assert_eq!(find_persona("The story must be clear and testable."), None);
        assert_eq!(find_persona("Keep it short.
  Be a strict reviewer."), Some("be"));
    }

    #[test]
    fn test_be_only_at_line_start() {
        assert_eq!(find_persona("The output should be short."), None);
    }

    #[test]
    fn test_keyword_matching_ignores_case() {
        assert!(contains_any_keyword("Use MARKDOWN headings", FORMAT_KEYWORDS));
        assert!(contains_any_keyword("Siga o PADRÃO abaixo", FORMAT_KEYWORDS));
        assert!(!contains_any_keyword("Just answer", FORMAT_KEYWORDS));
    }

    #[test]
    fn test_labelled_example() {
        assert!(has_labelled_example("Input: bug\nOutput: story"));
        assert!(has_labelled_example("ENTRADA : relato\nSAÍDA: história"));
        assert!(!has_labelled_example("Input: only one side"));
    }

    #[test]
    fn test_numbered_example() {
        assert!(has_numbered_example("### Example 1"));
        assert!(has_numbered_example("Exemplo   12:"));
        assert!(!has_numbered_example("For example, this"));
    }

    #[test]
    fn test_todo_markers() {
        assert_eq!(find_todos("[TODO] write this"), vec!["[TODO]"]);
        assert_eq!(find_todos("todo: later. Todo: again"), vec!["todo:", "Todo:"]);
        assert!(find_todos("A to-do list item").is_empty());
        assert!(find_todos("TODO without colon").is_empty());
    }

    #[test]
    fn test_technique_tags() {
        assert!(is_technique_tag("few-shot"));
        assert!(!is_technique_tag("langsmith"));
        assert!(!is_technique_tag("Pulled"));
        assert!(!is_technique_tag("  "));
    }

    #[test]
    fn test_detect_explicit_techniques() {
        let found = detect_techniques("Use chain of thought and a few-shot approach.");
        assert_eq!(found, vec!["few-shot", "chain-of-thought"]);
    }

    #[test]
    fn test_cot_requires_word_boundary() {
        assert!(!detect_techniques("Scotland escort").contains(&"chain-of-thought"));
        assert!(detect_techniques("Apply CoT.").contains(&"chain-of-thought"));
    }

    #[test]
    fn test_detect_inferred_techniques() {
        let found = detect_techniques(
            "Você é um Product Manager. Siga o processo: Passo 1 analise o bug. Exemplo abaixo.",
        );
        assert_eq!(
            found,
            vec!["role-playing", "task-decomposition", "step-by-step", "few-shot"]
        );
    }

    #[test]
    fn test_inference_does_not_duplicate_keywords() {
        let found = detect_techniques("Persona: you are a PM. Output format: markdown template.");
        assert_eq!(
            found.iter().filter(|l| **l == "role-playing").count(),
            1
        );
        assert_eq!(
            found.iter().filter(|l| **l == "output-format").count(),
            1
        );
    }
}
