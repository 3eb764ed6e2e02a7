//! Terminal output utilities for styled CLI output.
//!
//! This module provides a consistent interface for printing styled output
//! to the terminal, replacing direct `println!` calls with structured output.

use console::{Term, style};
use outfits_business::{ClothingItem, DataService, Slot, Wardrobe};
use outfits_business::models::MAX_RATING;
use outfits_business::onboarding::{OnboardingStep, STEPS};
use std::fmt::Display;

/// Terminal output helper for consistent styled output.
pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper writing to stdout.
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Print a success message with a green checkmark.
    pub fn success(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✓").green().bold(), message)),
        );
    }

    /// Print an error message with a red X.
    pub fn error(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✗").red().bold(), message)),
        );
    }

    /// Print a warning message with a yellow warning sign.
    pub fn warning(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("⚠").yellow().bold(), message)),
        );
    }

    /// Print an info message with a blue info icon.
    pub fn info(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("ℹ").blue().bold(), message)),
        );
    }

    /// Print a plain message without any prefix.
    pub fn print(&self, message: impl Display) {
        drop(self.term.write_line(&message.to_string()));
    }

    pub fn newline(&self) {
        drop(self.term.write_line(""));
    }

    /// Print a header with emphasis.
    pub fn header(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&style(message).bold().cyan().to_string()),
        );
    }

    pub fn subheader(&self, message: impl Display) {
        drop(self.term.write_line(&style(message).bold().to_string()));
    }

    pub fn divider(&self, width: usize) {
        drop(
            self.term
                .write_line(&style("─".repeat(width)).dim().to_string()),
        );
    }

    /// Print a labeled value with indentation.
    pub fn labeled_indent(&self, label: impl Display, value: impl Display, indent: usize) {
        let spaces = " ".repeat(indent);
        drop(
            self.term
                .write_line(&format!("{spaces}{}: {}", style(label).dim(), value)),
        );
    }

    /// Print a dim/muted message.
    pub fn dim(&self, message: impl Display) {
        drop(self.term.write_line(&style(message).dim().to_string()));
    }

    /// Both wardrobe slots as currently selected.
    pub fn slots<D: DataService>(&self, wardrobe: &Wardrobe<D>) {
        self.slot("Top", wardrobe.index(Slot::Top).index(), wardrobe.tops().len(), wardrobe.current_top());
        self.slot(
            "Bottom",
            wardrobe.index(Slot::Bottom).index(),
            wardrobe.bottoms().len(),
            wardrobe.current_bottom(),
        );
    }

    /// One wardrobe slot; position 0 is the None option.
    fn slot(&self, label: &str, position: usize, count: usize, item: Option<&ClothingItem>) {
        let shown = match item {
            Some(item) if item.tags.is_empty() => style("(untagged)".to_owned()).dim().to_string(),
            Some(item) => style(item.tags.join(", ")).white().bold().to_string(),
            None => style("None".to_owned()).dim().to_string(),
        };
        drop(self.term.write_line(&format!(
            "  {:<7} {} {}",
            style(label).yellow().bold(),
            style(format!("[{position}/{count}]")).dim(),
            shown
        )));
    }

    /// Print a coachmark for the walkthrough.
    pub fn coachmark(&self, index: usize, step: &OnboardingStep) {
        drop(self.term.write_line(&format!(
            "{} {} {}",
            style("➜").magenta().bold(),
            style(format!("Step {}/{}", index + 1, STEPS.len())).dim(),
            style(step.title).bold()
        )));
        drop(
            self.term
                .write_line(&format!("  {}", style(step.description).dim())),
        );
    }

    /// Print a count summary.
    pub fn count(&self, label: impl Display, count: usize) {
        drop(self.term.write_line(&format!(
            "{}: {} item(s)",
            style(label).dim(),
            style(count).cyan().bold()
        )));
    }
}

/// Filled and empty stars, or a dash when unrated.
pub fn stars(rating: Option<u8>) -> String {
    match rating {
        Some(r) => {
            let r = usize::from(r.min(MAX_RATING));
            format!(
                "{}{}",
                "★".repeat(r),
                "☆".repeat(usize::from(MAX_RATING) - r)
            )
        }
        None => "-".to_owned(),
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    } else {
        s.to_owned()
    }
}
