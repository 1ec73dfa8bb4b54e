//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use taskline_core::Item;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Render the visible slice of the list as a numbered table. Completed rows
/// keep their text struck through rather than hidden; rows the store has not
/// stamped yet show a syncing marker in place of a timestamp.
pub fn item_table(items: &[&Item]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "", "Todo", "Created"]);

    for (index, item) in items.iter().enumerate() {
        let mark = if item.completed { "[x]" } else { "[ ]" };
        let text = if item.completed {
            item.text.strikethrough().dimmed().to_string()
        } else {
            item.text.clone()
        };
        let created = match item.created_at {
            Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
            None => "syncing...".to_string(),
        };
        table.add_row(vec![(index + 1).to_string(), mark.to_string(), text, created]);
    }

    table
}
