pub mod api;

use crate::cli::ServeArgs;
use crate::llm::mask_token;
use log::{ info, warn };
use std::error::Error;

pub struct Server {
    args: ServeArgs,
}

impl Server {
    pub fn new(args: ServeArgs) -> Self {
        Self { args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        info!("--- Gateway Configuration ---");
        info!("Server Address: {}", self.args.server_addr);
        info!("Chat Base URL: {}", self.args.chat_base_url.as_deref().unwrap_or("OpenRouter default"));
        info!("Chat Model: {}", self.args.chat_model.as_deref().unwrap_or("client default"));
        if self.args.openrouter_api_key.trim().is_empty() {
            warn!("Upstream API Key: not set");
        } else {
            info!("Upstream API Key: {}", mask_token(self.args.openrouter_api_key.trim()));
        }
        info!("Upstream Timeout: {}s", self.args.upstream_timeout_secs);
        info!("TLS Enabled: {}", self.args.enable_tls);
        info!("-----------------------------");

        api::start_http_server(&self.args).await
    }
}
