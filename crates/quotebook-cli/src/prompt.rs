//! Interactive prompts for one-shot commands

use std::io::{self, Write};

use anyhow::Result;

use quotebook_core::Resolution;

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !is_interactive() {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(parse_yes(&input))
}

/// Ask which strategy to apply to pending conflicts
///
/// Returns `None` in non-interactive mode.
pub fn choose_resolution() -> Result<Option<Resolution>> {
    if !is_interactive() {
        return Ok(None);
    }

    println!();
    println!("How should these conflicts be resolved?");
    println!("  [1] Keep local categories");
    println!("  [2] Use server categories");
    println!("  [3] Keep both (adds a server copy of each quote)");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        match parse_choice(&input) {
            Some(resolution) => return Ok(Some(resolution)),
            None => println!("Enter 1, 2 or 3."),
        }
    }
}

pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

pub(crate) fn parse_yes(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}

fn parse_choice(input: &str) -> Option<Resolution> {
    match input.trim() {
        "1" => Some(Resolution::KeepLocal),
        "2" => Some(Resolution::KeepServer),
        "3" => Some(Resolution::Merge),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes() {
        assert!(parse_yes("y\n"));
        assert!(parse_yes(" YES "));
        assert!(!parse_yes(""));
        assert!(!parse_yes("nope"));
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1\n"), Some(Resolution::KeepLocal));
        assert_eq!(parse_choice("2"), Some(Resolution::KeepServer));
        assert_eq!(parse_choice("3"), Some(Resolution::Merge));
        assert_eq!(parse_choice("keep-server"), Some(Resolution::KeepServer));
        assert_eq!(parse_choice("9"), None);
    }
}
