// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Terminal prompts

use console::{style, Term};
use miette::Result;

/// Whether a person is at the terminal to answer prompts
pub(crate) fn interactive() -> bool {
    console::user_attended() && console::user_attended_stderr()
}

/// Ask for a line of text on stderr; empty answers return None
pub(crate) fn ask(question: &str) -> Result<Option<String>> {
    let term = Term::stderr();
    term.write_str(&format!("{} ", style(format!("{}:", question)).bold()))
        .map_err(|e| miette::miette!("Failed to write prompt: {}", e))?;
    let answer = term
        .read_line()
        .map_err(|e| miette::miette!("Failed to read answer: {}", e))?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

/// Ask a yes/no question, defaulting to no
pub(crate) fn confirm(question: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("{} [y/N] ", question))
        .map_err(|e| miette::miette!("Failed to write prompt: {}", e))?;
    let answer = term
        .read_line()
        .map_err(|e| miette::miette!("Failed to read answer: {}", e))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
