// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction shared by every grading prompt.
pub const EVIDENCE_INSTRUCTION: &str = "\
    CRITICAL: Base every judgement on evidence present in the provided text. \
    Do NOT infer skills, years or achievements that are not stated. \
    When evidence is missing, treat the requirement as unmet and score accordingly.";

/// Builds a full system prompt from a role description and the JSON-only rules.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

/// Fills `{name}` placeholders in a single pass. Inserted values are not
/// scanned again, so braces inside user text stay literal; unknown
/// placeholders and JSON braces are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let filled = tail[1..].find('}').and_then(|end| {
            let name = &tail[1..=end];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (end + 2, *value))
        });
        match filled {
            Some((consumed, value)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
