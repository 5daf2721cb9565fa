//! Timestamped console transcript shared by both orchestrators.

use colored::Colorize;

fn stamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Informational transcript line.
pub fn note(message: &str) {
    println!("[{}] {}", stamp(), message);
}

/// Step-passed transcript line.
pub fn pass(message: &str) {
    println!("[{}] {} {}", stamp(), "✅".green(), message);
}

/// Step-failed transcript line.
pub fn fail(message: &str) {
    println!("[{}] {} {}", stamp(), "❌".red(), message);
}
