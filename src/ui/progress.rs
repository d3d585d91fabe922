use crate::extractor::BatchProgress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_package_progress(&self, total_packages: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(total_packages));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} packages {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("Preparing...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn clear(&self) {
        if self.enabled {
            self.multi_progress.clear().ok();
        }
    }
}

pub fn update_package_progress(pb: &ProgressBar, progress: &BatchProgress) {
    pb.set_position(progress.packages_processed as u64);

    let skipped = if progress.failures > 0 {
        format!(" [{} skipped]", progress.failures)
    } else {
        String::new()
    };

    match progress.current_package {
        Some(ref package) => {
            let eta = progress.estimated_remaining();
            if progress.packages_processed > 0 && eta.as_secs() > 0 {
                pb.set_message(format!("{}{} (ETA: {})", package, skipped, format_duration(eta)));
            } else {
                pb.set_message(format!("{}{}", package, skipped));
            }
        }
        None => pb.set_message(format!("Finishing...{}", skipped)),
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
