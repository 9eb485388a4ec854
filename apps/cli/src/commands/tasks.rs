//! Tasks command: inspect the configured task definitions.

use colored::Colorize;

use crate::config::VivaConfig;

/// Longest task-text preview printed per entry.
const PREVIEW_LEN: usize = 60;

/// Execute the tasks command.
pub fn execute(config: &VivaConfig) -> anyhow::Result<()> {
    if config.task_definitions.is_empty() {
        println!("No task definitions configured.");
        println!(
            "  {}",
            "Add [task_definitions.<session>] tables with t1 = \"...\" entries.".dimmed()
        );
        return Ok(());
    }

    for (session_id, session_tasks) in config.task_definitions.iter() {
        println!("{}", format!("Session {session_id}").bold().cyan());
        for (task_id, text) in session_tasks {
            println!("  {}  {}", task_id.green(), preview(text).dimmed());
        }
        println!();
    }
    Ok(())
}

/// Collapses whitespace and truncates to [`PREVIEW_LEN`] characters.
fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_LEN {
        let cut: String = flat.chars().take(PREVIEW_LEN).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(preview("Describe your favorite meal."), "Describe your favorite meal.");
    }

    #[test]
    fn test_newlines_collapse_to_spaces() {
        assert_eq!(preview("Talk about\na trip\nyou took."), "Talk about a trip you took.");
    }

    #[test]
    fn test_long_text_is_truncated_with_ellipsis() {
        let text = "a ".repeat(80);
        let shown = preview(&text);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_LEN + 3);
    }
}
