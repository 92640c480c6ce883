use std::collections::HashMap;
use std::time::Instant;

use super::job_stage::JobStage;

/// Metric name carrying the decoded input duration in seconds.
pub const AUDIO_SECONDS_METRIC: &str = "audio_seconds";

/// Observer for transcode job events.
///
/// Keeps the orchestration code free of any particular output mechanism:
/// the CLI prints a summary, the async front end stays silent, and tests
/// record what happened.
pub trait PipelineLogger: Send {
    /// The job entered `stage`.
    fn stage(&mut self, stage: JobStage);

    /// Record how long a stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (frame counts, packet counts, ...).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-job summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn stage(&mut self, _stage: JobStage) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger: tracks per-stage timing and metrics and reports a
/// summary with the real-time factor through `log`.
pub struct StdoutPipelineLogger {
    stages: Vec<JobStage>,
    timings: HashMap<String, f64>,
    metrics: HashMap<String, f64>,
    start_time: Instant,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary, or `None` if no stage was timed.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let audio_seconds = self.metrics.get(AUDIO_SECONDS_METRIC).copied().unwrap_or(0.0);
        let mut lines = vec![format!(
            "Morph summary ({audio_seconds:.1}s audio, {:.2}s total):",
            elapsed_ms / 1000.0
        )];

        // Report stages in the order the job ran them.
        for stage in self.stages.iter().filter(|s| !s.is_terminal()) {
            if let Some(&ms) = self.timings.get(stage.name()) {
                let pct = if elapsed_ms > 0.0 {
                    ms / elapsed_ms * 100.0
                } else {
                    0.0
                };
                lines.push(format!("  {:8}: {ms:8.1}ms  ({pct:4.1}%)", stage.name()));
            }
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: {}", self.metrics[name]));
        }

        if audio_seconds > 0.0 && elapsed_ms > 0.0 {
            let factor = audio_seconds / (elapsed_ms / 1000.0);
            lines.push(format!("  Real-time factor: {factor:.1}x"));
        }

        if let Some(last) = self.stages.last() {
            lines.push(format!("  Final stage: {last}"));
        }

        Some(lines.join("\n"))
    }

    pub fn stages(&self) -> &[JobStage] {
        &self.stages
    }

    /// Info messages in the order they were logged.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn timing_for(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).copied()
    }

    pub fn metric_for(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn stage(&mut self, stage: JobStage) {
        self.stages.push(stage);
        log::debug!("Stage: {stage}");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        *self.timings.entry(stage.to_string()).or_default() += duration_ms;
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
