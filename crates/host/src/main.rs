// crates/host/src/main.rs

//! Interactive prompt wiring the chat client, calendar backend, and agent.

mod agent;
mod format;
mod log;

use std::io::{self, BufRead, Write};

use anyhow::Result;

use calchat_core::calendar::{CalendarStore, MemoryCalendar};
use calchat_core::catalog::ToolCatalog;
use calchat_core::config::AgentConfig;
use calchat_core::datetime::DateTimeResolver;
use calchat_core::google::GoogleCalendar;
use calchat_core::openai_client::OpenAiClient;

use agent::ChatAgent;

fn main() -> Result<()> {
    let config = AgentConfig::from_env()?;
    let client = OpenAiClient::from_env(&config)?;
    let resolver = DateTimeResolver::new(config.timezone);
    let catalog = ToolCatalog::new();

    let store: Box<dyn CalendarStore> = match GoogleCalendar::from_env(&config) {
        Ok(google) => Box::new(google),
        Err(e) => {
            log::warn(format!("{e}; using the in-memory calendar"));
            Box::new(MemoryCalendar::new())
        }
    };

    println!("CalChat - natural-language calendar assistant");
    println!("Timezone: {}", config.timezone.name());
    println!("Type a request and press Enter. Type 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let message = input.trim();

        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("quit") || message.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        // Each message gets its own isolated run.
        let agent = ChatAgent::new(&client, store.as_ref(), &resolver, &catalog, &config);

        match agent.run(message) {
            Ok(answer) => println!("\n{answer}\n"),
            Err(e) => println!("\n[ERROR] {e}\n"),
        }
    }

    Ok(())
}
