use indicatif::{ProgressBar, ProgressStyle};

pub fn default_style() -> ProgressStyle {
    match ProgressStyle::default_bar()
        .template("{prefix:>10} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        Ok(style) => style.progress_chars("##-"),
        Err(_) => ProgressStyle::default_bar(),
    }
}

/// Reuses one bar across the grouping, rewrite and cleanup phases.
pub fn start_phase(progress_bar: &ProgressBar, phase: &'static str, length: u64) {
    progress_bar.reset();
    progress_bar.set_prefix(phase);
    progress_bar.set_length(length);
    progress_bar.set_message("");
}
