use crate::memory::ContextBundle;

pub const CHAT_SYSTEM_PROMPT: &str = "You are a strict, grounded food safety assistant.";

const CHAT_RULES: &str = "\
CRITICAL RULES:
- Use ONLY the knowledge provided below
- Do NOT add outside facts
- Be clear if evidence is mixed
- Keep responses short, calm, and consumer-friendly";

const KNOWLEDGE_SEPARATOR: &str = "\n\n---\n\n";

/// Renders the blended context and the new question into the chat prompt.
pub fn build_chat_prompt(bundle: &ContextBundle, question: &str) -> String {
    let recent = render_lines(
        bundle
            .recent
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content)),
    );
    let similar = render_lines(
        bundle
            .similar
            .iter()
            .map(|s| format!("{}: {}", s.message.role, s.message.content)),
    );
    let knowledge = if bundle.knowledge.is_empty() {
        "(none)".to_string()
    } else {
        bundle
            .knowledge
            .iter()
            .map(|k| {
                format!(
                    "Ingredient: {}\nRole: {}\nEvidence: {}\nSummary: {}",
                    k.ingredient, k.role, k.evidence, k.summary
                )
            })
            .collect::<Vec<_>>()
            .join(KNOWLEDGE_SEPARATOR)
    };

    format!(
        "You are a food safety assistant chatbot.\n\n{CHAT_RULES}\n\n\
         RECENT CONVERSATION:\n{recent}\n\n\
         RELATED PAST DISCUSSION:\n{similar}\n\n\
         KNOWLEDGE BASE:\n{knowledge}\n\n\
         USER QUESTION:\n{question}\n"
    )
}

fn render_lines(lines: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = lines.collect();
    if lines.is_empty() {
        "(none)".to_string()
    } else {
        lines.join("\n")
    }
}
