//! Simple test for MistralBrain chat completion.
//!
//! Run with: cargo run -p mistral-brain --example test_chat
//! Or with a custom message: cargo run -p mistral-brain --example test_chat -- "Your message here"
//!
//! Make sure to set environment variables in .env:
//!   MISTRAL_API_KEY - Mistral API key for authentication

use std::env;
use std::io::Write;

use assistant_core::{ChatMessage, ChatRequest, ModelResponse};
use futures::StreamExt;
use mistral_brain::{LanguageModel, MistralBrain};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let message_text = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        "Hello! Please respond with a short greeting.".to_string()
    };

    println!("Initializing MistralBrain...");
    let brain = MistralBrain::from_env()?;

    println!("Brain initialized: {}", brain.name());
    println!("API URL: {}", brain.config().api_url);
    println!("Model: {}", brain.config().model);
    println!();

    println!("Sending: \"{}\"", message_text);
    println!("Streaming response...\n");

    let request = ChatRequest::new(vec![
        ChatMessage::system("You are a helpful AI assistant."),
        ChatMessage::user(message_text),
    ])
    .streaming(true);

    println!("=== Response ===");
    match brain.complete(request).await? {
        ModelResponse::Text(mut stream) => {
            while let Some(fragment) = stream.next().await {
                print!("{}", fragment?);
                std::io::stdout().flush()?;
            }
            println!();
        }
        ModelResponse::FunctionCall(call) => {
            println!("(function call) {} {:?}", call.name, call.arguments);
        }
    }
    println!("================");

    Ok(())
}
