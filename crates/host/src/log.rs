// crates/host/src/log.rs

//! Colored logging for the conversation loop.

use std::fmt::Display;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

/// Log one iteration of the agent loop.
pub fn step(iteration: usize, context_size: usize) {
    eprintln!(
        "{BLUE}{BOLD}[agent]{RESET} {DIM}Iteration {}{RESET} {DIM}(ctx: {}){RESET}",
        iteration, context_size
    );
}

/// Log a tool call.
pub fn tool_call(name: &str, args: &str) {
    let args_preview = truncate(args, 100);
    eprintln!(
        "{BLUE}{BOLD}[agent]{RESET} {CYAN}→ {}{RESET} {DIM}{}{RESET}",
        name, args_preview
    );
}

/// Log a tool result.
pub fn tool_result(name: &str, result: &str, is_error: bool) {
    let preview = truncate(result, 150);
    let (symbol, color) = if is_error { ("✗", RED) } else { ("✓", GREEN) };
    eprintln!(
        "{BLUE}{BOLD}[agent]{RESET} {color}{symbol} {}{RESET}: {DIM}{}{RESET}",
        name, preview
    );
}

/// Log the model's text response.
pub fn response(text: &str) {
    let preview = truncate(text, 200);
    eprintln!("{BLUE}{BOLD}[agent]{RESET} {WHITE}← {}{RESET}", preview);
}

/// Log run completion.
pub fn done(message: impl Display) {
    eprintln!("{BLUE}{BOLD}[agent]{RESET} {GREEN}✓ Done:{RESET} {}", message);
}

/// Log an error.
pub fn error(message: impl Display) {
    eprintln!("{RED}{BOLD}[error]{RESET} {}", message);
}

/// Log a warning.
pub fn warn(message: impl Display) {
    eprintln!("{YELLOW}[warn]{RESET} {}", message);
}

/// Truncate and clean string for display.
fn truncate(s: &str, max: usize) -> String {
    let clean: String = s.chars().filter(|c| !c.is_control() || *c == ' ').collect();
    let trimmed = clean.trim();
    if trimmed.len() > max {
        let cut = trimmed
            .char_indices()
            .take_while(|(i, _)| *i < max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(max);
        format!("{}...", &trimmed[..cut])
    } else {
        trimmed.to_string()
    }
}
