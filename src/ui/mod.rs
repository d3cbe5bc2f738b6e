//! Terminal presentation
//!
//! - Styled status lines for command results
//! - Feature progress bars ([`progress`])
//! - Interactive input prompts ([`prompt`])

pub mod progress;
pub mod prompt;

use console::Style;

pub use progress::{InteractiveProgressReporter, ProgressReporter, SilentProgressReporter};
pub use prompt::{Prompter, TerminalPrompter};

/// `  Installed dev` style status line
pub fn status(verb: &str, message: &str) {
    println!("{:>12} {}", Style::new().bold().green().apply_to(verb), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", Style::new().bold().yellow().apply_to("warning:"), message);
}

/// Manifest-level message (`message_success` / `message_failure`)
pub fn message(text: &str, failed: bool) {
    let style = if failed {
        Style::new().red()
    } else {
        Style::new().cyan()
    };
    for line in text.lines() {
        println!("{}", style.apply_to(line));
    }
}
