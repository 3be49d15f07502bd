use clap::{ Args as ClapArgs, Parser, Subcommand };

use crate::llm::{ LlmConfig, DEFAULT_UPSTREAM_TIMEOUT_SECS };
use crate::server::api::DEFAULT_SYSTEM_PROMPT;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the chat gateway HTTP server
    Serve(ServeArgs),
    /// Chat with a running gateway from the terminal
    Chat(ChatArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    // --- Upstream LLM Provider Args ---
    /// API Key for the upstream completion provider (OpenRouter). Requests fail with a configuration error while unset.
    #[arg(long, env = "OPENROUTER_API_KEY", default_value = "", hide_env_values = true)]
    pub openrouter_api_key: String,

    /// Full URL of the chat completions endpoint
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let the client pick OpenRouter
    pub chat_base_url: Option<String>,

    /// Model name for chat completion (e.g., google/gemini-2.0-flash-001)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// System prompt prepended to every conversation.
    #[arg(long, env = "SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    /// Site URL sent to OpenRouter as HTTP-Referer
    #[arg(long, env = "SITE_URL")]
    pub site_url: Option<String>,

    /// Site name sent to OpenRouter as X-Title
    #[arg(long, env = "SITE_NAME")]
    pub site_name: Option<String>,

    /// Seconds to wait for the upstream provider before giving up.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    pub upstream_timeout_secs: u64,

    // --- TLS Args ---
    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}

impl ServeArgs {
    pub fn llm_config(&self) -> LlmConfig {
        let api_key = if !self.openrouter_api_key.trim().is_empty() {
            Some(self.openrouter_api_key.trim().to_string())
        } else {
            None
        };
        LlmConfig {
            api_key,
            completion_model: self.chat_model.clone(),
            base_url: self.chat_base_url.clone(),
            site_url: self.site_url.clone(),
            site_name: self.site_name.clone(),
            timeout_secs: self.upstream_timeout_secs,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// URL of the gateway chat endpoint.
    #[arg(long, env = "GATEWAY_URL", default_value = "http://127.0.0.1:3000/api/ai-chat")]
    pub gateway_url: String,

    /// Location the conversation starts on (e.g., /destinations/bali)
    #[arg(long, default_value = "/")]
    pub location: String,

    /// Seconds to wait for the gateway before showing the fallback reply.
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "20")]
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_means_unset() {
        let args = Args::parse_from(["wayfarer-chat", "serve", "--openrouter-api-key", "  "]);
        let Command::Serve(serve) = args.command else { panic!("expected serve") };
        assert!(serve.llm_config().api_key.is_none());
        assert_eq!(serve.llm_config().timeout_secs, DEFAULT_UPSTREAM_TIMEOUT_SECS);
    }

    #[test]
    fn chat_defaults() {
        let args = Args::parse_from(["wayfarer-chat", "chat", "--location", "/blog"]);
        let Command::Chat(chat) = args.command else { panic!("expected chat") };
        assert_eq!(chat.location, "/blog");
        assert_eq!(chat.timeout_secs, 20);
    }
}
