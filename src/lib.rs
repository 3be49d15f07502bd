pub mod cli;
pub mod client;
pub mod engine;
pub mod error;
pub mod llm;
pub mod models;
pub mod server;

use cli::{ Args, Command };
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve_args) => {
            let server = Server::new(serve_args);
            server.run().await
        }
        Command::Chat(chat_args) => client::run_chat(chat_args).await,
    }
}
