//! Change set and result display

use crate::ui;
use colored::Colorize;
use reconcile::{ChangeSet, ChangeSummary, EmitSummary, GroupChangeSet, UserChangeSet};

/// Entries listed per partition before eliding the rest
const LIST_LIMIT: usize = 10;

/// Display a change set
pub fn changes(changes: &ChangeSet) {
    if changes.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    users(&changes.users);
    if let Some(groups) = &changes.groups {
        groups_diff(groups);
    }

    println!();
    ui::kv("Total", &summary_line(&changes.summary()));
}

fn users(users: &UserChangeSet) {
    ui::section("Users");

    let creates: Vec<String> = users
        .create
        .iter()
        .map(|c| c.account.username.clone())
        .collect();
    let updates: Vec<String> = users
        .update
        .iter()
        .filter_map(|u| {
            u.changes
                .as_ref()
                .map(|c| format!("{} ({})", u.username, c.changed_fields().join(", ")))
        })
        .collect();
    let deletes: Vec<String> = users
        .delete
        .iter()
        .map(|d| d.account.username.clone())
        .collect();

    entries(&"+".green().to_string(), &creates);
    entries(&"~".yellow().to_string(), &updates);
    entries(&"-".red().to_string(), &deletes);
}

fn groups_diff(groups: &GroupChangeSet) {
    ui::section("Groups");

    let creates: Vec<String> = groups
        .create
        .iter()
        .map(|g| format!("{} ({} members)", g.shortname, g.members.len()))
        .collect();
    let updates: Vec<String> = groups
        .update
        .iter()
        .filter(|g| !g.members.is_empty())
        .map(|g| {
            let removes = g.members.iter().filter(|m| m.is_remove()).count();
            format!(
                "{} (+{} -{})",
                g.shortname,
                g.members.len() - removes,
                removes
            )
        })
        .collect();
    let deletes: Vec<String> = groups.delete.iter().map(|g| g.shortname.clone()).collect();

    entries(&"+".green().to_string(), &creates);
    entries(&"~".yellow().to_string(), &updates);
    entries(&"-".red().to_string(), &deletes);
}

fn entries(symbol: &str, items: &[String]) {
    for item in items.iter().take(LIST_LIMIT) {
        println!("  {symbol} {item}");
    }
    if items.len() > LIST_LIMIT {
        ui::dim(&format!("... and {} more", items.len() - LIST_LIMIT));
    }
}

/// One-line summary of a change set
pub fn summary_line(summary: &ChangeSummary) -> String {
    format!(
        "{} to create, {} to update, {} to delete ({} unchanged)",
        summary.additions, summary.modifications, summary.removals, summary.unchanged
    )
}

/// Display what a sink did
pub fn emitted(summary: &EmitSummary) {
    println!();
    ui::success(&format!("Done ({} changes)", summary.total_changes()));

    if summary.created > 0 {
        println!("    • {} created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} modified", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} removed", summary.removed);
    }
    if !summary.skipped.is_empty() {
        let skipped: Vec<&str> = summary.skipped.iter().map(String::as_str).collect();
        ui::kv("Skipped", &ui::truncate_list(&skipped, 4));
    }
    for file in &summary.files {
        ui::kv("Wrote", &file.display().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let summary = ChangeSummary {
            additions: 2,
            modifications: 1,
            removals: 0,
            unchanged: 5,
        };
        assert_eq!(
            summary_line(&summary),
            "2 to create, 1 to update, 0 to delete (5 unchanged)"
        );
    }
}
