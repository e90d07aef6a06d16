//! Quote command handlers

use anyhow::{bail, Context, Result};

use quotebook_core::{App, CategoryFilter, QuoteError};

use crate::output::Output;
use crate::prompt::confirm;

/// Show a random quote from the remembered filter, or once from `category`
pub fn show(app: &mut App, category: Option<CategoryFilter>, output: &Output) -> Result<()> {
    let picked = match &category {
        Some(filter) => app.show_random_in(filter),
        None => app.show_random(),
    };

    match picked {
        Ok(quote) => output.print_quote(&quote),
        Err(QuoteError::EmptyCollection) => output.print_empty_category(),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// List quotes with their store positions
pub fn list(app: &App, category: Option<CategoryFilter>, output: &Output) -> Result<()> {
    let filter = category.unwrap_or_else(|| app.filter().clone());
    let quotes: Vec<_> = app
        .store()
        .quotes()
        .iter()
        .enumerate()
        .filter(|(_, quote)| filter.matches(quote))
        .collect();
    output.print_quotes(&quotes);
    Ok(())
}

pub fn add(app: &mut App, text: &str, category: &str, output: &Output) -> Result<()> {
    let quote = app.add_quote(text, category)?;
    output.success(&format!("Added quote to {}", quote.category));
    Ok(())
}

/// Delete a quote after confirmation
pub fn delete(app: &mut App, position: usize, yes: bool, output: &Output) -> Result<()> {
    let index = to_index(position)?;
    let Some(quote) = app.store().quotes().get(index) else {
        bail!(QuoteError::Index {
            index,
            len: app.store().len()
        });
    };

    if !yes && output.should_prompt() {
        println!("Delete quote: \"{}\" - {}", quote.text, quote.category);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    remove(app, position, output)
}

/// Delete without asking
pub fn remove(app: &mut App, position: usize, output: &Output) -> Result<()> {
    let index = to_index(position)?;
    let removed = app.delete_quote(index).context("Failed to delete quote")?;
    output.success(&format!("Deleted: \"{}\"", removed.text));
    Ok(())
}

pub fn categories(app: &App, output: &Output) -> Result<()> {
    output.print_categories(&app.store().categories(), &app.filter().to_string());
    Ok(())
}

/// Show or change the remembered category filter
pub fn filter(app: &mut App, category: Option<CategoryFilter>, output: &Output) -> Result<()> {
    let Some(filter) = category else {
        if output.is_json() {
            println!("{}", serde_json::json!({ "filter": app.filter().to_string() }));
        } else {
            println!("{}", app.filter());
        }
        return Ok(());
    };

    if let CategoryFilter::Named(name) = &filter {
        if !app.store().categories().contains(name) {
            output.warn(&format!("No quotes in '{}' yet", name));
        }
    }
    app.set_filter(filter)?;
    output.success(&format!("Filter set to {}", app.filter()));
    Ok(())
}

pub fn stats(app: &App, output: &Output) -> Result<()> {
    output.print_stats(&app.stats());
    Ok(())
}

/// Convert a 1-based position shown by `list` into a store index
pub(crate) fn to_index(position: usize) -> Result<usize> {
    match position.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("Positions start at 1"),
    }
}
