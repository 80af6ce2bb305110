//! Maps captured intervals onto a fixed-size 2-D line drawing.
//!
//! Coordinates follow the usual canvas convention: the origin is the top-left
//! corner and `y` grows downward. Terminal painting flips them in `ui::charting`.

use itertools::{Itertools, MinMaxResult};
use ratatui::style::Color;

pub const WIDTH: f64 = 260.0;
pub const HEIGHT: f64 = 120.0;
/// Vertical midpoint, where the idle baseline sits
pub const BASELINE_Y: f64 = HEIGHT / 2.0;
/// `y` of the lowest normalized latency
pub const Y_MAX: f64 = 100.0;
/// Vertical span between the lowest and highest normalized latency
pub const Y_AMPLITUDE: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub join: LineJoin,
}

pub const BASELINE_STROKE: Stroke = Stroke {
    color: Color::DarkGray,
    width: 2.0,
    join: LineJoin::Miter,
};

pub const TRACE_STROKE: Stroke = Stroke {
    color: Color::Rgb(0xF5, 0x9E, 0x0B),
    width: 3.0,
    join: LineJoin::Round,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavePoint {
    pub x: f64,
    pub y: f64,
}

impl WavePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for WavePoint {
    fn from(v: (f64, f64)) -> Self {
        WavePoint { x: v.0, y: v.1 }
    }
}

impl From<WavePoint> for (f64, f64) {
    fn from(p: WavePoint) -> Self {
        (p.x, p.y)
    }
}

/// Line-drawing primitives of the rendering surface
pub trait Surface {
    fn clear(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke(&mut self, stroke: Stroke);
}

/// A rendered waveform, recomputed from intervals on every render
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    Baseline,
    Trace(Vec<WavePoint>),
}

impl Waveform {
    pub fn from_intervals(intervals: &[f64]) -> Self {
        if intervals.len() < 2 {
            return Waveform::Baseline;
        }

        let (min, max) = match intervals.iter().copied().minmax_by(f64::total_cmp) {
            MinMaxResult::MinMax(min, max) => (min, max),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::NoElements => return Waveform::Baseline,
        };
        let mut range = max - min;
        if range == 0.0 {
            range = 1.0;
        }

        let last = (intervals.len() - 1) as f64;
        let points = intervals
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let x = (i as f64 / last) * WIDTH;
                let normalized = (v - min) / range;
                WavePoint::new(x, Y_MAX - normalized * Y_AMPLITUDE)
            })
            .collect();

        Waveform::Trace(points)
    }

    pub fn is_baseline(&self) -> bool {
        matches!(self, Waveform::Baseline)
    }

    pub fn points(&self) -> &[WavePoint] {
        match self {
            Waveform::Baseline => &[],
            Waveform::Trace(points) => points,
        }
    }

    /// Clears `surface` and draws this waveform as one stroked path
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear();
        match self {
            Waveform::Baseline => {
                surface.move_to(0.0, BASELINE_Y);
                surface.line_to(WIDTH, BASELINE_Y);
                surface.stroke(BASELINE_STROKE);
            }
            Waveform::Trace(points) => {
                for (i, p) in points.iter().enumerate() {
                    if i == 0 {
                        surface.move_to(p.x, p.y);
                    } else {
                        surface.line_to(p.x, p.y);
                    }
                }
                surface.stroke(TRACE_STROKE);
            }
        }
    }
}

/// A stroked polyline in canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct StrokedPath {
    pub points: Vec<WavePoint>,
    pub stroke: Stroke,
}

impl StrokedPath {
    /// Consecutive point pairs, i.e. the straight segments to paint
    pub fn segments(&self) -> impl Iterator<Item = (WavePoint, WavePoint)> + '_ {
        self.points.iter().copied().tuple_windows()
    }
}

/// In-memory surface that keeps every stroked path until the next clear
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sketch {
    pending: Vec<WavePoint>,
    paths: Vec<StrokedPath>,
}

impl Sketch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(waveform: &Waveform) -> Self {
        let mut sketch = Self::new();
        waveform.draw(&mut sketch);
        sketch
    }

    pub fn paths(&self) -> &[StrokedPath] {
        &self.paths
    }
}

impl Surface for Sketch {
    fn clear(&mut self) {
        self.pending.clear();
        self.paths.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.pending.clear();
        self.pending.push(WavePoint::new(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.pending.push(WavePoint::new(x, y));
    }

    fn stroke(&mut self, stroke: Stroke) {
        if self.pending.is_empty() {
            return;
        }
        self.paths.push(StrokedPath {
            points: std::mem::take(&mut self.pending),
            stroke,
        });
    }
}
