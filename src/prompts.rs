pub const PROFILE: &str = include_str!("../data/prompts/profile.txt");
pub const CHAT_LIST: &str = include_str!("../data/prompts/chat_list.txt");
pub const CHAT_HISTORY: &str = include_str!("../data/prompts/chat_history.txt");
pub const CANVASES: &str = include_str!("../data/prompts/canvases.txt");
pub const VAULT_NODES: &str = include_str!("../data/prompts/vault_nodes.txt");
pub const INTEGRATIONS: &str = include_str!("../data/prompts/integrations.txt");
pub const LOG_EXTRACTION: &str = include_str!("../data/prompts/log_extraction.txt");
pub const DESCRIBE_IMAGE: &str = include_str!("../data/prompts/describe_image.txt");
pub const CHAT_SYSTEM: &str = include_str!("../data/prompts/chat_system.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Single pass over the template: inserted values are never scanned for
/// placeholders, and unknown placeholders are kept as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => result.push_str(value),
                    None => {
                        result.push_str("{{");
                        result.push_str(key);
                        result.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Breaks up code fences in caller-supplied text before it is spliced into
/// an instruction, so the model cannot echo them back as output markers.
pub fn neutralize_fences(text: &str) -> String {
    text.replace("```", "'''")
}
