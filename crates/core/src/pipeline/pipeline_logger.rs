use std::collections::HashMap;
use std::time::Instant;

use crate::shared::constants::FRAME_LOG_INTERVAL;

/// Named steps of one loop iteration, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Capture,
    Preprocess,
    Detect,
    Render,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::Preprocess => "preprocess",
            Stage::Detect => "detect",
            Stage::Render => "render",
        }
    }
}

/// Observer for live-loop events.
///
/// Keeps timing and progress reporting out of the loop itself so tests can
/// run the loop silently.
pub trait PipelineLogger: Send {
    /// Called once per processed frame with the running frame count.
    fn progress(&mut self, frames: usize);

    /// Record how long a stage took for one frame.
    fn timing(&mut self, stage: Stage, duration_ms: f64);

    /// Record a per-frame metric such as the face count.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _frames: usize) {}
    fn timing(&mut self, _stage: Stage, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Count, sum and maximum of a stream of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct RunningStat {
    count: usize,
    total: f64,
    max: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        self.max = if self.count == 0 {
            value
        } else {
            self.max.max(value)
        };
        self.count += 1;
        self.total += value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Logger for the binary: keeps running per-stage timings and metrics,
/// prints a progress line every `throttle_frames` frames and a summary at
/// the end. Memory use does not grow with session length.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<Stage, RunningStat>,
    metrics: HashMap<String, RunningStat>,
    start_time: Instant,
    frames: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames;
        let mut lines = vec![format!(
            "Session summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        for stage in [Stage::Capture, Stage::Preprocess, Stage::Detect, Stage::Render] {
            let Some(stat) = self.timings.get(&stage) else {
                continue;
            };
            let total_ms = stat.total;
            let avg_ms = stat.mean();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)",
                stage.as_str()
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let stat = &self.metrics[name];
            lines.push(format!("  {name}: avg {:.1}  max {:.0}", stat.mean(), stat.max));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(FRAME_LOG_INTERVAL)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, frames: usize) {
        self.frames = frames;
        if frames % self.throttle_frames == 0 {
            let secs = self.start_time.elapsed().as_secs_f64();
            let fps = if secs > 0.0 { frames as f64 / secs } else { 0.0 };
            log::info!("Processed {frames} frames ({fps:.1} fps)");
        }
    }

    fn timing(&mut self, stage: Stage, duration_ms: f64) {
        self.timings.entry(stage).or_default().record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        match self.metrics.get_mut(name) {
            Some(stat) => stat.record(value),
            None => {
                let mut stat = RunningStat::default();
                stat.record(value);
                self.metrics.insert(name.to_string(), stat);
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1);
        logger.timing(Stage::Detect, 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing(Stage::Detect, 20.0);
        logger.timing(Stage::Detect, 30.0);
        logger.timing(Stage::Render, 5.0);

        let detect = logger.timings[&Stage::Detect];
        assert_eq!(detect.count, 2);
        assert_relative_eq!(detect.total, 50.0);
        assert_relative_eq!(detect.max, 30.0);
        assert_eq!(logger.timings[&Stage::Render].count, 1);
        assert!(!logger.timings.contains_key(&Stage::Capture));
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("faces", 3.0);
        logger.metric("faces", 4.0);
        assert_relative_eq!(logger.metrics["faces"].mean(), 3.5);
    }

    #[test]
    fn test_long_session_keeps_constant_state() {
        let mut logger = StdoutPipelineLogger::new(1000);
        for i in 0..10_000 {
            logger.timing(Stage::Detect, (i % 7) as f64);
            logger.metric("faces", (i % 3) as f64);
        }
        assert_eq!(logger.timings.len(), 1);
        assert_eq!(logger.metrics.len(), 1);
        let faces = logger.metrics["faces"];
        assert_eq!(faces.count, 10_000);
        assert_relative_eq!(faces.max, 2.0);
        assert_relative_eq!(logger.timings[&Stage::Detect].max, 6.0);
    }

    #[test]
    fn test_running_stat_max_of_negative_samples() {
        let mut stat = RunningStat::default();
        stat.record(-4.0);
        stat.record(-2.0);
        assert_relative_eq!(stat.max, -2.0);
        assert_relative_eq!(stat.mean(), -3.0);
    }

    #[test]
    fn test_summary_lists_stages_in_loop_order() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(2);
        logger.timing(Stage::Render, 1.0);
        logger.timing(Stage::Capture, 2.0);
        logger.timing(Stage::Detect, 3.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Session summary (2 frames"));
        let capture = summary.find("capture").unwrap();
        let detect = summary.find("detect").unwrap();
        let render = summary.find("render").unwrap();
        assert!(capture < detect && detect < render);
    }

    #[test]
    fn test_summary_includes_metrics_and_fps() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(5);
        logger.metric("faces", 1.0);
        logger.metric("faces", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("faces: avg 1.5  max 2"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frame_count() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=25 {
            logger.progress(i);
        }
        assert_eq!(logger.frames, 25);
    }

    #[test]
    fn test_default_throttle() {
        let logger = StdoutPipelineLogger::default();
        assert_eq!(logger.throttle_frames, FRAME_LOG_INTERVAL);
    }
}
