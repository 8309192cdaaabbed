// Prompt templates for the conversational core.
// All generation prompts are defined here.

/// Domain restriction prepended to every conversational prompt.
pub const DOMAIN_PROMPT: &str = "\
You are a helpful and knowledgeable career/job/college counselling specialist. \
Only respond to career/job/college questions. If a question is outside this \
domain, politely refuse to answer.";

pub const RESUME_ANALYSIS_PROMPT: &str = r#"You are a professional career counsellor. Analyze the following resume and provide:
1. Summary of candidate profile
2. Strengths and skills
3. Suggested job roles or industries
4. Areas of improvement

Resume Content:
{resume_text}"#;

/// Analysis prompt with the full extracted resume text embedded.
pub fn analysis_prompt(resume_text: &str) -> String {
    RESUME_ANALYSIS_PROMPT.replace("{resume_text}", resume_text)
}

/// Conversational prompt: domain preamble followed by the rendered history,
/// which ends with the current user turn.
pub fn conversation_prompt(rendered_history: &str) -> String {
    format!("{DOMAIN_PROMPT}\n\n{rendered_history}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_embeds_resume_text() {
        let prompt = analysis_prompt("Jane Doe\nData Analyst");
        assert!(prompt.contains("Jane Doe\nData Analyst"));
        assert!(prompt.contains("Areas of improvement"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_conversation_prompt_starts_with_domain_preamble() {
        let prompt = conversation_prompt("User: hello");
        assert!(prompt.starts_with(DOMAIN_PROMPT));
        assert!(prompt.ends_with("User: hello"));
    }
}
