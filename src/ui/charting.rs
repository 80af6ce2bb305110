use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as Segment},
        Block, Gauge, Widget,
    },
};

use crate::analysis::ConfidenceDisplay;
use crate::waveform::{Sketch, HEIGHT, WIDTH};

/// Canvas `y` grows downward, the terminal canvas grows upward
fn flip(y: f64) -> f64 {
    HEIGHT - y
}

/// Paints a [`Sketch`] onto a ratatui canvas with the waveform's logical bounds
pub struct WaveformCanvas<'a> {
    sketch: &'a Sketch,
    block: Option<Block<'a>>,
}

impl<'a> WaveformCanvas<'a> {
    pub fn new(sketch: &'a Sketch) -> Self {
        Self {
            sketch,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for WaveformCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let sketch = self.sketch;
        let mut canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, WIDTH])
            .y_bounds([0.0, HEIGHT])
            .paint(move |ctx| {
                for path in sketch.paths() {
                    for (a, b) in path.segments() {
                        ctx.draw(&Segment {
                            x1: a.x,
                            y1: flip(a.y),
                            x2: b.x,
                            y2: flip(b.y),
                            color: path.stroke.color,
                        });
                    }
                }
            });
        if let Some(block) = self.block {
            canvas = canvas.block(block);
        }
        canvas.render(area, buf);
    }
}

/// Confidence ring as a terminal gauge; the filled share mirrors the ring offset
pub fn confidence_gauge(display: &ConfidenceDisplay) -> Gauge<'static> {
    Gauge::default()
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(0xF5, 0x9E, 0x0B))
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .ratio(display.ring_fill())
        .label(format!("{}%", display.percent))
}

/// Format a millisecond value for labels
pub fn format_ms(val: f64) -> String {
    if val >= 10_000.0 {
        format!("{:.1}s", val / 1000.0)
    } else {
        format!("{:.0}ms", val)
    }
}
