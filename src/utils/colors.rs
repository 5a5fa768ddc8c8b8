// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Consistent styling for CLI output

use colored::Colorize;

use crate::errors::{PipespecError, RecoverySuggestion};

/// Style for commands and paths
pub fn code(msg: &str) -> colored::ColoredString {
    msg.cyan()
}

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.len().max(40)));
}

/// Print a styled section
pub fn print_section(title: &str) {
    println!();
    println!("{}:", title.bold());
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}

/// Print every violation carried by an error, each with its fix if one is
/// known. `detailed` adds the fix's steps and commands.
pub fn print_violations(err: &PipespecError, detailed: bool) {
    for violation in err.violations() {
        println!("  {} {} {}", "✗".red(), format!("[{}]", violation.kind()).dimmed(), violation);
        let Some(suggestion) = RecoverySuggestion::for_violation(violation) else {
            continue;
        };
        if detailed {
            for line in suggestion.to_string().lines() {
                println!("      {}", line);
            }
        } else {
            println!("      {} {}", "fix:".yellow(), suggestion.action);
        }
    }
}
