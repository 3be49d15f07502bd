pub mod chat;

pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_CHAT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const MAX_TOKENS: u32 = 500;
pub const TEMPERATURE: f32 = 0.7;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub site_url: Option<String>,
    pub site_name: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion_model: None,
            base_url: None,
            site_url: None,
            site_name: None,
            timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

const MIN_MASKED_REVEAL_LEN: usize = 24;

/// Masks a credential for logging: first 7 chars + "***" + last 4 chars, or
/// just "***" when the key is too short for that to hide most of it.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len < MIN_MASKED_REVEAL_LEN || !token.is_ascii() {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_token_hides_short_keys() {
        assert_eq!(mask_token(""), "***");
        assert_eq!(mask_token("sk-or-1234"), "***");
        assert_eq!(mask_token("sk-or-123456789"), "***");
        assert_eq!(mask_token("sk-or-v1-0123456789abcd"), "***");
    }

    #[test]
    fn mask_token_keeps_head_and_tail() {
        let masked = mask_token("sk-or-v1-abcdefghijklmnop");
        assert_eq!(masked, "sk-or-v***mnop");
        assert!(!masked.contains("abcdefgh"));
    }
}
