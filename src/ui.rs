use colored::{ColoredString, Colorize};

fn status(symbol: ColoredString, msg: &str) -> String {
    format!("{symbol} {msg}")
}

/// Underline sized to the title's display characters
fn rule(title: &str) -> String {
    "─".repeat(title.chars().count())
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", status("ℹ".blue(), msg));
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", status("✓".green(), msg));
}

/// Print an error message to stderr
pub fn error(msg: &str) {
    eprintln!("{}", status("✗".red(), msg));
}

pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a title with an underline
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", rule(title).dimmed());
}

pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Shorten a list for display, e.g. `a, b, c (+4 more)`
pub fn truncate_list(items: &[&str], max: usize) -> String {
    if items.len() <= max {
        items.join(", ")
    } else {
        format!("{} (+{} more)", items[..max].join(", "), items.len() - max)
    }
}
