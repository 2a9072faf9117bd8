use crate::constants::{PROGRESS_SPINNER_TEMPLATE, SPINNER_TICK_CHARS, SPINNER_TICK_MILLIS};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create the spinner that shows which file is being compressed
///
/// It ticks on its own thread and only ever displays the message it was
/// last given. Hidden when quiet mode is on.
pub fn create_progress_spinner() -> ProgressBar {
    if crate::logger::is_quiet() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(PROGRESS_SPINNER_TEMPLATE) {
        pb.set_style(style.tick_chars(SPINNER_TICK_CHARS));
    }
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MILLIS));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_carries_message() {
        let pb = create_progress_spinner();
        pb.set_message("icons/logo.png");
        assert_eq!(pb.message(), "icons/logo.png");
        pb.finish_and_clear();
    }
}
