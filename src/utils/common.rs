// src/utils/common.rs

use indicatif::{ProgressBar, ProgressStyle};

pub const RECORDS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {msg} [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})";

/// Creates a progress bar, or a spinner when the total is unknown. A hidden
/// bar is returned when `hidden` is set so call sites never branch.
pub fn create_progress_bar(total_items: u64, message: &str, template: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = if total_items == 0 {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::new(total_items)
    };
    pb.set_message(message.to_string());
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar()) // Fallback style
            .progress_chars("=> "),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = create_progress_bar(3, "Curating", RECORDS_TEMPLATE, true);
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        assert!(pb.is_hidden());
    }

    #[test]
    fn test_zero_total_gives_spinner() {
        let pb = create_progress_bar(0, "Curating", "{bad template", false);
        assert_eq!(pb.length(), None);
    }
}
