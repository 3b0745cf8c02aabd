//! Subcommand handlers and terminal prompts.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use cuaderno_core::{export_file_name, DataService, FlatItem};

use crate::Command;

type CmdResult = Result<(), Box<dyn Error>>;

pub(crate) fn dispatch(service: &mut DataService, command: Command) -> CmdResult {
    match command {
        Command::Overview { limit, json } => overview(service, limit, json),
        Command::List {
            category,
            search,
            json,
        } => list(service, category.as_deref(), search.as_deref(), json),
        Command::Categories => {
            categories(service);
            Ok(())
        }
        Command::AddCategory { name, emoji } => {
            service.create_category(&name, &emoji)?;
            if let Some(created) = service.dataset().categories.last() {
                println!("Created category {} {} ({})", created.emoji, created.name, created.id);
            }
            Ok(())
        }
        Command::Add {
            category_id,
            key,
            value,
            note,
        } => {
            service.create_item(&category_id, &key, &value, &note)?;
            if let Some(created) = service
                .find_category(&category_id)
                .and_then(|c| c.items.last())
            {
                println!("Added {} ({})", created.key, created.id);
            }
            Ok(())
        }
        Command::Edit {
            category_id,
            item_id,
            key,
            value,
            note,
            move_to,
        } => {
            let mut session = service.begin_edit(&category_id, &item_id)?;
            if let Some(key) = key {
                session.key = key;
            }
            if let Some(value) = value {
                session.value = value;
            }
            if let Some(note) = note {
                session.note = note;
            }
            let target = move_to.unwrap_or_else(|| session.category_id.clone());
            service.submit_edit(session, &target)?;
            println!("Updated {}", item_id);
            Ok(())
        }
        Command::Delete {
            category_id,
            item_id,
            yes,
        } => {
            let label = service
                .find_category(&category_id)
                .and_then(|c| c.find_item(&item_id))
                .map_or_else(|| item_id.clone(), |it| it.key.clone());
            if !yes && !confirm(&format!("Delete \"{}\"?", label))? {
                println!("Cancelled");
                return Ok(());
            }
            service.delete_item(&category_id, &item_id)?;
            println!("Deleted {}", label);
            Ok(())
        }
        Command::Export { path } => export(service, path),
        Command::Import { path, yes } => import(service, &path, yes),
        Command::Wipe { yes } => {
            if !yes && !confirm("Erase all data and restore the default categories?")? {
                println!("Cancelled");
                return Ok(());
            }
            let dataset = service.reset_dataset()?;
            println!("Reset to {} empty categories", dataset.categories.len());
            Ok(())
        }
    }
}

fn overview(service: &DataService, limit: usize, json: bool) -> CmdResult {
    let overview = service.overview(limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    println!(
        "{} items in {} categories",
        overview.total_items, overview.total_categories
    );
    if !overview.latest.is_empty() {
        println!();
        println!("Recent:");
        for it in &overview.latest {
            println!("  {}", item_line(it));
        }
    }
    Ok(())
}

fn list(
    service: &DataService,
    category_id: Option<&str>,
    search: Option<&str>,
    json: bool,
) -> CmdResult {
    let mut items = match category_id {
        Some(id) => service.category_items(id)?,
        None => service.all_items(),
    };
    if let Some(query) = search {
        items = service.search_filter(&items, query);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        println!("No items");
    } else {
        for it in &items {
            println!("{}", item_line(it));
        }
    }
    Ok(())
}

fn categories(service: &DataService) {
    for category in &service.dataset().categories {
        println!(
            "{} {}  {}  ({} items)",
            category.emoji,
            category.name,
            category.id,
            category.items.len()
        );
    }
}

fn export(service: &DataService, path: Option<PathBuf>) -> CmdResult {
    let path = path.unwrap_or_else(|| default_export_path(Utc::now()));
    std::fs::write(&path, service.export_json()?)?;
    println!("Exported to {}", path.display());
    Ok(())
}

/// Export files are dated by the UTC calendar day.
fn default_export_path(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(export_file_name(now.date_naive()))
}

fn import(service: &mut DataService, path: &Path, yes: bool) -> CmdResult {
    let text = std::fs::read_to_string(path)?;
    if !yes && !confirm(&format!("Replace all current data with {}?", path.display()))? {
        println!("Cancelled");
        return Ok(());
    }

    let dataset = service.import_json(&text)?;
    println!(
        "Imported {} categories, {} items",
        dataset.categories.len(),
        dataset.item_count()
    );
    Ok(())
}

fn item_line(it: &FlatItem) -> String {
    let mut line = format!(
        "{} {}  [{}] {}: {}",
        it.category_emoji, it.category_name, it.item.id, it.item.key, it.item.value
    );
    if !it.item.note.is_empty() {
        line.push_str(&format!("  ({})", it.item.note));
    }
    line
}

/// Ask on stderr and read one line from stdin.
pub fn prompt(question: &str) -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", question)?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer)
}

fn confirm(question: &str) -> io::Result<bool> {
    prompt(&format!("{} [y/N] ", question)).map(|answer| is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "sí"
    )
}
