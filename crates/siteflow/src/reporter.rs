use colored::Colorize;
use siteflow_core::Reporter;

/// Prints deploy/remove phases to the terminal; step details go to tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn status(&self, message: &str) {
        println!("{} {}", "▶".cyan(), message.bold());
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}
