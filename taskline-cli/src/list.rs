//! Item list screen - live list, input row, filter chips

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Confirm, Input};
use taskline_core::services::ItemListManager;
use taskline_core::{Identity, Item, ItemFilter, TasklineContext};

use crate::output;

pub enum ListOutcome {
    Logout,
    Quit,
}

/// How long to wait for the store to reflect a mutation before giving the
/// prompt back. The subscription keeps running either way.
const SNAPSHOT_WAIT: Duration = Duration::from_secs(5);

pub async fn run(ctx: &TasklineContext, identity: &Identity) -> Result<ListOutcome> {
    let mut manager = ctx.list_manager();
    manager.bind(Some(identity));
    await_snapshot(&mut manager).await;

    output::info("Commands: add <text>, done <n>, edit <n>, rm <n>, filter <all|active|completed>, logout, quit");

    loop {
        manager.poll_changes();
        render(identity, &manager);

        let line: String = Input::new()
            .with_prompt("taskline")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "add" => {
                manager.save(rest).await;
                await_snapshot(&mut manager).await;
            }
            "done" => {
                if let Some(item) = visible_item(&manager, rest) {
                    manager.toggle(&item).await;
                    await_snapshot(&mut manager).await;
                }
            }
            "edit" => {
                if let Some(item) = visible_item(&manager, rest) {
                    manager.begin_edit(&item);
                    let text: String = Input::new()
                        .with_prompt("Edit")
                        .with_initial_text(item.text.clone())
                        .allow_empty(true)
                        .interact_text()?;
                    if text.trim().is_empty() {
                        manager.cancel_edit();
                        output::info("Edit cancelled.");
                    } else {
                        manager.save(&text).await;
                        await_snapshot(&mut manager).await;
                    }
                }
            }
            "rm" => {
                if let Some(item) = visible_item(&manager, rest) {
                    let confirmed = Confirm::new()
                        .with_prompt(format!("Delete \"{}\"? This cannot be undone", item.text))
                        .default(false)
                        .interact()?;
                    if confirmed {
                        manager.delete(&item.id).await;
                        await_snapshot(&mut manager).await;
                    }
                }
            }
            "filter" => match ItemFilter::parse(rest) {
                Some(filter) => manager.set_filter(filter),
                None => output::warning("Filters: all, active, completed"),
            },
            "logout" => return Ok(ListOutcome::Logout),
            "quit" | "exit" => return Ok(ListOutcome::Quit),
            "help" => output::info(
                "Commands: add <text>, done <n>, edit <n>, rm <n>, filter <all|active|completed>, logout, quit",
            ),
            _ => output::warning("Unknown command. Try: help"),
        }
    }
}

/// Wait briefly for the next snapshot so the rendered list reflects the
/// mutation that was just issued.
async fn await_snapshot(manager: &mut ItemListManager) {
    let _ = tokio::time::timeout(SNAPSHOT_WAIT, manager.next_change()).await;
}

/// Resolve a 1-based index into the currently visible list.
fn visible_item(manager: &ItemListManager, arg: &str) -> Option<Item> {
    let index: usize = match arg.parse() {
        Ok(n) => n,
        Err(_) => {
            output::warning("Give the item number shown in the list.");
            return None;
        }
    };
    match manager.visible().get(index.wrapping_sub(1)) {
        Some(item) => Some((*item).clone()),
        None => {
            output::warning("No item with that number.");
            None
        }
    }
}

fn render(identity: &Identity, manager: &ItemListManager) {
    let visible = manager.visible();

    println!();
    println!(
        "{}  {}",
        "My Todos".bold(),
        identity.email.as_str().dimmed()
    );
    println!(
        "filter: {}   {} shown / {} total",
        manager.filter().as_str().cyan(),
        visible.len(),
        manager.items().len()
    );

    if visible.is_empty() {
        println!("{}", "No todos yet. Add one with: add <text>".italic());
        return;
    }

    println!("{}", output::item_table(&visible));
}
