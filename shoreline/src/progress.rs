use indicatif::{ProgressBar, ProgressStyle};

/// Returns a hidden bar; it is drawn once added to a
/// `MultiProgress`.
pub fn bar(header: String, length: u64) -> ProgressBar {
    let pb = ProgressBar::hidden();
    pb.set_prefix(header);
    pb.set_length(length);
    if let Ok(style) = ProgressStyle::with_template("{prefix}...\n[{wide_bar:.cyan/blue}] {pos}/{len}") {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
