//! Sliding-window reward and speed telemetry.
//!
//! [`TelemetrySink`] buffers `(reward, speed)` pairs; each time `window`
//! pairs are buffered it appends one averaged [`TelemetrySample`] and clears
//! the buffer. Samples can be exported as CSV (`tick,rewards,vels`) and as
//! one SVG line chart per metric.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File stem of the reward chart.
pub const REWARD_PLOT: &str = "Reward";
/// File stem of the velocity chart.
pub const VELOCITY_PLOT: &str = "Velocity";

/// One averaged telemetry point. Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Global tick at which the window filled.
    pub tick: u64,
    pub mean_reward: f32,
    pub mean_speed: f64,
}

// ---------------------------------------------------------------------------
// TelemetrySink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TelemetrySink {
    window: usize,
    rewards: Vec<f32>,
    speeds: Vec<f64>,
    samples: Vec<TelemetrySample>,
}

impl TelemetrySink {
    /// `window` is clamped to at least 1.
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            rewards: Vec::with_capacity(window),
            speeds: Vec::with_capacity(window),
            samples: Vec::new(),
        }
    }

    pub const fn window(&self) -> usize {
        self.window
    }

    /// Buffer one pair; returns the new sample when the window fills.
    #[allow(clippy::cast_precision_loss)]
    pub fn record(&mut self, tick: u64, reward: f32, speed: f64) -> Option<TelemetrySample> {
        self.rewards.push(reward);
        self.speeds.push(speed);
        if self.rewards.len() < self.window {
            return None;
        }

        let n = self.rewards.len();
        let sample = TelemetrySample {
            tick,
            mean_reward: self.rewards.iter().sum::<f32>() / n as f32,
            mean_speed: self.speeds.iter().sum::<f64>() / n as f64,
        };
        self.rewards.clear();
        self.speeds.clear();
        self.samples.push(sample);
        tracing::debug!(
            tick,
            mean_reward = sample.mean_reward,
            mean_speed = sample.mean_speed,
            "telemetry sample"
        );
        Some(sample)
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    /// Pairs buffered toward the next sample.
    pub fn pending(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop all samples and the partial window.
    pub fn clear(&mut self) {
        self.rewards.clear();
        self.speeds.clear();
        self.samples.clear();
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Write `tick,rewards,vels` rows.
    pub fn write_csv(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "tick,rewards,vels")?;
        for s in &self.samples {
            writeln!(out, "{},{},{}", s.tick, s.mean_reward, s.mean_speed)?;
        }
        out.flush()
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut out = BufWriter::new(File::create(path)?);
        self.write_csv(&mut out)?;
        tracing::info!(path = %path.display(), samples = self.samples.len(), "telemetry saved");
        Ok(())
    }

    /// Write `Reward.svg` and `Velocity.svg` into `dir`, returning their paths.
    pub fn plot(&self, dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let ticks: Vec<f64> = self.samples.iter().map(|s| tick_f64(s.tick)).collect();
        let rewards: Vec<f64> = self
            .samples
            .iter()
            .map(|s| f64::from(s.mean_reward))
            .collect();
        let speeds: Vec<f64> = self.samples.iter().map(|s| s.mean_speed).collect();

        let mut written = Vec::with_capacity(2);
        for (name, values) in [(REWARD_PLOT, &rewards), (VELOCITY_PLOT, &speeds)] {
            let path = dir.join(format!("{name}.svg"));
            std::fs::write(&path, line_chart_svg(name, &ticks, values))?;
            written.push(path);
        }
        Ok(written)
    }
}

impl Default for TelemetrySink {
    fn default() -> Self {
        Self::new(10)
    }
}

#[allow(clippy::cast_precision_loss)]
fn tick_f64(tick: u64) -> f64 {
    tick as f64
}

// ---------------------------------------------------------------------------
// SVG
// ---------------------------------------------------------------------------

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN: f64 = 56.0;

fn extent(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

/// Line chart with a title, a `Timestep` x label and min/max tick labels.
fn line_chart_svg(title: &str, xs: &[f64], ys: &[f64]) -> String {
    let (x0, x1) = extent(xs);
    let (y0, y1) = extent(ys);
    let plot_w = 2.0f64.mul_add(-MARGIN, WIDTH);
    let plot_h = 2.0f64.mul_add(-MARGIN, HEIGHT);
    let px = |x: f64| MARGIN + (x - x0) / (x1 - x0) * plot_w;
    let py = |y: f64| HEIGHT - MARGIN - (y - y0) / (y1 - y0) * plot_h;

    let mut svg = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r##"<rect x="{MARGIN}" y="{MARGIN}" width="{plot_w}" height="{plot_h}" fill="none" stroke="#ccc"/>"##
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="18">{title}</text>"#,
        WIDTH / 2.0,
        MARGIN / 2.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="14">Timestep</text>"#,
        WIDTH / 2.0,
        HEIGHT - 12.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="{MARGIN}" y="{}" font-size="11">{x0}</text><text x="{}" y="{}" text-anchor="end" font-size="11">{x1}</text>"#,
        HEIGHT - MARGIN + 16.0,
        WIDTH - MARGIN,
        HEIGHT - MARGIN + 16.0,
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="end" font-size="11">{y1:.3}</text><text x="{}" y="{}" text-anchor="end" font-size="11">{y0:.3}</text>"#,
        MARGIN - 4.0,
        MARGIN + 4.0,
        MARGIN - 4.0,
        HEIGHT - MARGIN,
    );

    if !xs.is_empty() {
        let points: Vec<String> = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| format!("{:.2},{:.2}", px(x), py(y)))
            .collect();
        let _ = writeln!(
            svg,
            r##"<polyline fill="none" stroke="#1f77b4" stroke-width="1.5" points="{}"/>"##,
            points.join(" ")
        );
    }
    svg.push_str("</svg>\n");
    svg
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
