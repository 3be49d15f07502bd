use crate::cli::ChatArgs;
use crate::engine::context::location_to_context;
use crate::engine::store::MemoryStore;
use crate::engine::transport::HttpTransport;
use crate::engine::{ ConversationEngine, TurnOutcome };
use crate::models::chat::{ Message, Role };
use log::info;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, BufReader };

const HELP: &str = "Commands: /go <path>, /clear, /toggle, /quit";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Say(&'a str),
    Go(&'a str),
    Clear,
    Toggle,
    Quit,
    Help,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some(("/go", path)) => Input::Go(path.trim()),
        _ =>
            match line {
                "/clear" => Input::Clear,
                "/toggle" => Input::Toggle,
                "/quit" | "/exit" => Input::Quit,
                "/help" | "/go" => Input::Help,
                _ => Input::Say(line),
            }
    }
}

fn render(message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    let marker = if message.is_error {
        " [offline]"
    } else if message.is_fallback {
        " [fallback]"
    } else {
        ""
    };
    format!("{}{}: {}", speaker, marker, message.content)
}

/// Terminal front end for the conversation engine.
pub async fn run_chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("Using gateway at {}", args.gateway_url);

    let engine = ConversationEngine::new(
        Arc::new(HttpTransport::new(args.gateway_url.clone())),
        Arc::new(MemoryStore::new())
    ).with_timeout(Duration::from_secs(args.timeout_secs));
    engine.set_location(&args.location);
    engine.toggle_open();

    for message in engine.messages() {
        println!("{}", render(&message));
    }
    println!("({}) {}", location_to_context(&engine.location()), HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Quit => {
                break;
            }
            Input::Help => println!("{}", HELP),
            Input::Go(path) => {
                engine.set_location(path);
                println!("({})", location_to_context(path));
            }
            Input::Clear => {
                engine.clear_history();
                for message in engine.messages() {
                    println!("{}", render(&message));
                }
            }
            Input::Toggle => {
                let state = if engine.toggle_open() { "open" } else { "closed" };
                println!("(chat {})", state);
            }
            Input::Say(text) => {
                if !engine.is_open() {
                    println!("(chat is closed, /toggle to open it)");
                    continue;
                }
                if !text.is_empty() {
                    println!("...");
                }
                match engine.send_message(text).await {
                    TurnOutcome::Ignored | TurnOutcome::Superseded => {}
                    TurnOutcome::Resolved | TurnOutcome::Degraded => {
                        if let Some(reply) = engine.messages().last() {
                            println!("{}", render(reply));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("/go /destinations/bali"), Input::Go("/destinations/bali"));
        assert_eq!(parse_input(" /clear "), Input::Clear);
        assert_eq!(parse_input("/toggle"), Input::Toggle);
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/go"), Input::Help);
        assert_eq!(parse_input("best food in Rome?"), Input::Say("best food in Rome?"));
    }

    #[test]
    fn render_marks_error_replies() {
        let msg = Message::assistant("offline copy").with_error();
        assert_eq!(render(&msg), "Assistant [offline]: offline copy");
        assert_eq!(render(&Message::user("hi")), "You: hi");
    }
}
