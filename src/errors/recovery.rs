// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 elt-builder contributors

//! Recovery suggestions
//!
//! Concrete follow-up steps shown alongside version-control warnings.

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// The repository path has no `.git` directory
    pub fn not_a_repository() -> Self {
        Self {
            action: "Initialize a git repository to track pipeline changes".into(),
            commands: vec!["git init".into()],
        }
    }

    /// The repository has no remote to push to
    pub fn no_remote() -> Self {
        Self {
            action: "Add a remote to share pipeline changes".into(),
            commands: vec!["git remote add origin <url>".into()],
        }
    }

    /// The push to the remote failed
    pub fn push_failed() -> Self {
        Self {
            action: "Push manually once the remote is reachable".into(),
            commands: vec!["git push".into()],
        }
    }

    /// Committing failed after the files were already written
    pub fn commit_failed() -> Self {
        Self {
            action: "The files are written; commit them manually later".into(),
            commands: vec!["git add -A".into(), "git commit".into()],
        }
    }

    /// Render as a single-line hint
    pub fn hint(&self) -> String {
        if self.commands.is_empty() {
            return self.action.clone();
        }
        format!("{} ({})", self.action, self.commands.join(" && "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_includes_commands() {
        let hint = RecoverySuggestion::no_remote().hint();
        assert!(hint.contains("git remote add origin"));

        let hint = RecoverySuggestion::commit_failed().hint();
        assert!(hint.contains("git add -A && git commit"));
    }
}
