// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipespec contributors

//! Stage-by-stage progress for rehearsals

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress over the stages of one pipeline.
///
/// Finished stages are printed above the bar so the log reads in pipeline
/// order.
pub struct StageProgress {
    stages: Vec<String>,
    current: usize,
    bar: ProgressBar,
}

impl StageProgress {
    pub fn new(stages: Vec<String>) -> Self {
        let bar = ProgressBar::new(stages.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{msg} [{bar:30.cyan/blue}] {pos}/{len}") {
            bar.set_style(style.progress_chars("█▓░"));
        }
        Self {
            stages,
            current: 0,
            bar,
        }
    }

    /// Progress that draws nothing
    pub fn hidden(stages: Vec<String>) -> Self {
        Self {
            stages,
            current: 0,
            bar: ProgressBar::hidden(),
        }
    }

    pub fn start(&mut self) {
        if let Some(stage) = self.stages.get(self.current) {
            self.bar.set_message(format!("→ {}", stage));
        }
    }

    pub fn complete(&mut self) {
        if let Some(stage) = self.stages.get(self.current) {
            self.bar.println(format!("  {} {}", "✓".green(), stage));
        }
        self.advance();
    }

    /// Mark the current stage as halting the pipeline
    pub fn fail(&mut self, reason: &str) {
        if let Some(stage) = self.stages.get(self.current) {
            self.bar
                .println(format!("  {} {} - {}", "✗".red(), stage, reason.dimmed()));
        }
        self.advance();
    }

    pub fn skip(&mut self) {
        if let Some(stage) = self.stages.get(self.current) {
            self.bar
                .println(format!("  {} {} (skipped)", "○".dimmed(), stage.dimmed()));
        }
        self.advance();
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.stages.len()
    }

    fn advance(&mut self) {
        self.current += 1;
        self.bar.inc(1);
        if self.is_complete() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progress() {
        let mut progress = StageProgress::hidden(vec![
            "Source".to_string(),
            "ManualApproval".to_string(),
            "DeployToProduction".to_string(),
        ]);

        progress.start();
        progress.complete();
        assert!(!progress.is_complete());
        progress.start();
        progress.fail("rejected");
        progress.skip();
        assert!(progress.is_complete());
    }
}
