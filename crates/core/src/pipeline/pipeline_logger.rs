use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for ingestion events.
///
/// Decouples the use case from specific output mechanisms (stdout, log
/// crate) so each caller can observe progress without changing the
/// orchestration code.
pub trait PipelineLogger: Send {
    /// Report photo-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one photo.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger: throttled progress with a time-remaining estimate,
/// per-stage timings, and a summary at the end of the run.
pub struct StdoutPipelineLogger {
    throttle: usize,
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    processed: usize,
    total: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            timings: HashMap::new(),
            start_time: Instant::now(),
            processed: 0,
            total: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was timed.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let elapsed_ms = elapsed_secs * 1000.0;
        let mut lines = vec![format!(
            "Ingestion summary ({} of {} photos, {}):",
            self.processed,
            self.total,
            format_duration(elapsed_secs)
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        if self.processed > 0 && elapsed_secs > 0.0 {
            let rate = self.processed as f64 / elapsed_secs;
            lines.push(format!("  Throughput: {rate:.1} photos/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.processed = current;
        self.total = total;
        if total == 0 || (current % self.throttle != 0 && current != total) {
            return;
        }
        let pct = current as f64 / total as f64 * 100.0;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        match estimate_remaining(elapsed, current, total) {
            Some(remaining) if current < total => log::info!(
                "Analyzing: {current}/{total} photos ({pct:.1}%), about {} remaining",
                format_duration(remaining)
            ),
            _ => log::info!("Analyzing: {current}/{total} photos ({pct:.1}%)"),
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

/// Linear extrapolation of the remaining time from the average so far.
pub fn estimate_remaining(elapsed_secs: f64, current: usize, total: usize) -> Option<f64> {
    if current == 0 || current > total || !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
        return None;
    }
    let per_item = elapsed_secs / current as f64;
    Some(per_item * (total - current) as f64)
}

/// "42 seconds", "1 minute 5 seconds", "3 minutes 1 second".
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds < 60.0 {
        let s = seconds.round() as u64;
        return format!("{s} second{}", plural(s));
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let rest = (seconds % 60.0).round() as u64;
    format!(
        "{minutes} minute{} {rest} second{}",
        plural(minutes),
        plural(rest)
    )
}

fn plural(n: u64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
