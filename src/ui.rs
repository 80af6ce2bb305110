pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{app::App, session::Phase, waveform::Sketch};

use self::charting::{confidence_gauge, format_ms, WaveformCanvas};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const PANEL_HEIGHT: u16 = 12;
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const PLACEHOLDER: &str = "Start typing. The rhythm between your key presses is captured.";

/// Hard-wraps `line` into chunks at most `width` columns wide
fn wrap_line(line: &str, width: u16) -> Vec<String> {
    let width = width.max(1) as usize;
    let mut rows = vec![String::new()];
    let mut used = 0;
    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width && used > 0 {
            rows.push(String::new());
            used = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(c);
        }
        used += w;
    }
    rows
}

fn status_line(app: &App) -> Line<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let phase_style = match app.phase() {
        Phase::Idle => Style::default().fg(Color::DarkGray),
        Phase::Recording => Style::default().fg(Color::Green),
        Phase::Locked => Style::default().fg(Color::Yellow),
        Phase::Resulted => Style::default().fg(Color::Cyan),
    };

    let mut spans = vec![
        Span::styled("keypulse ", bold),
        Span::styled(format!("[{}] ", app.phase()), phase_style.patch(bold)),
    ];
    if app.phase() == Phase::Locked {
        let frame = SPINNER[(app.ticks() % SPINNER.len() as u64) as usize];
        spans.push(Span::styled(format!("{frame} "), phase_style));
    }
    spans.push(Span::raw(app.readout.status.clone()));
    Line::from(spans)
}

fn render_text_area(app: &App, area: Rect, buf: &mut Buffer) {
    let text = app.machine.text();
    let capturing = app.machine.is_capturing();
    let count = format!(" {} characters ", app.readout.char_count);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Type freely ")
        .title_bottom(Line::from(count).right_aligned())
        .border_style(if capturing {
            Style::default()
        } else {
            Style::default().add_modifier(Modifier::DIM)
        });
    let inner = block.inner(area);

    if text.is_empty() && app.phase() == Phase::Idle {
        Paragraph::new(Span::styled(
            PLACEHOLDER,
            Style::default()
                .add_modifier(Modifier::DIM | Modifier::ITALIC),
        ))
        .block(block)
        .wrap(Wrap { trim: false })
        .render(area, buf);
        return;
    }

    let mut rows: Vec<String> = text
        .split('\n')
        .flat_map(|line| wrap_line(line, inner.width))
        .collect();
    if capturing && rows.last().is_some_and(|r| r.width() >= inner.width as usize) {
        rows.push(String::new());
    }

    // keep the tail in view
    let skip = rows.len().saturating_sub(inner.height as usize);
    let last = rows.len().saturating_sub(1);
    let lines: Vec<Line> = rows
        .into_iter()
        .enumerate()
        .skip(skip)
        .map(|(i, row)| {
            let mut line = Line::raw(row);
            if capturing && i == last {
                line.push_span(Span::styled(
                    "█",
                    Style::default().add_modifier(Modifier::SLOW_BLINK),
                ));
            }
            line
        })
        .collect();

    Paragraph::new(lines).block(block).render(area, buf);
}

fn render_result_panel(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let block = Block::default().borders(Borders::ALL).title(" Result ");
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // label
            Constraint::Length(1), // confidence ring
            Constraint::Length(1), // padding
            Constraint::Length(1), // method
            Constraint::Length(1), // analyzed at
            Constraint::Length(1), // rhythm summary
            Constraint::Min(0),
        ])
        .split(inner);

    Paragraph::new(Span::styled(
        app.readout.label.clone(),
        bold.fg(Color::Rgb(0xF5, 0x9E, 0x0B)),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(rows[0], buf);

    confidence_gauge(&app.readout.confidence).render(rows[1], buf);

    if let Some(method) = app.readout.method {
        Paragraph::new(Span::styled(method.to_string(), dim))
            .alignment(Alignment::Center)
            .render(rows[3], buf);
    }

    if let Some(at) = app.readout.analyzed_at {
        Paragraph::new(Span::styled(
            format!("analyzed {}", at.format("%H:%M:%S")),
            dim,
        ))
        .alignment(Alignment::Center)
        .render(rows[4], buf);
    }

    let rhythm = match app.rhythm() {
        Some(summary) => format!(
            "{} intervals · avg {} · sd {} · max {}",
            app.machine.intervals().len(),
            format_ms(summary.mean_ms),
            format_ms(summary.std_dev_ms),
            format_ms(summary.longest_pause_ms),
        ),
        None => "no intervals yet".to_string(),
    };
    Paragraph::new(Span::styled(rhythm, dim))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(rows[5], buf);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),            // status
                Constraint::Min(3),               // text area
                Constraint::Length(PANEL_HEIGHT), // waveform + result
                Constraint::Length(1),            // legend
            ])
            .split(area);

        Paragraph::new(status_line(self)).render(chunks[0], buf);

        render_text_area(self, chunks[1], buf);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[2]);

        let sketch = Sketch::of(&self.waveform());
        WaveformCanvas::new(&sketch)
            .block(Block::default().borders(Borders::ALL).title(" Rhythm "))
            .render(panels[0], buf);

        render_result_panel(self, panels[1], buf);

        let legend = match self.phase() {
            Phase::Resulted => "(ctrl+l) clear / (esc)ape",
            Phase::Locked => "analyzing... / (ctrl+l) clear / (esc)ape",
            Phase::Idle | Phase::Recording => "(tab) analyze / (ctrl+l) clear / (esc)ape",
        };
        Paragraph::new(Span::styled(
            legend,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, Analyzer};
    use crate::error::AnalysisError;
    use crate::runtime::PulseEvent;
    use crate::session::{SessionSnapshot, TextEdit};
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Arc;

    struct Fixed;

    impl Analyzer for Fixed {
        fn analyze(&self, _: &SessionSnapshot) -> Result<AnalysisResult, AnalysisError> {
            Ok(AnalysisResult::new("Happy (NLP)", Some(0.837)))
        }
    }

    fn create_test_app() -> (App, Receiver<PulseEvent>) {
        let (tx, rx) = mpsc::channel();
        (App::new(Arc::new(Fixed), tx), rx)
    }

    fn type_into(app: &mut App, text: &str) {
        for (i, c) in text.chars().enumerate() {
            app.keydown(TextEdit::Insert(c), i as f64 * 100.0 + (i % 5) as f64 * 11.0);
        }
    }

    fn render(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn analyzed_app() -> App {
        let (mut app, rx) = create_test_app();
        type_into(&mut app, "such a wonderful morning");
        app.submit();
        match rx.recv().unwrap() {
            PulseEvent::Analysis(outcome) => app.on_analysis(outcome),
            other => panic!("expected analysis outcome, got {other:?}"),
        }
        app
    }

    #[test]
    fn test_wrap_line() {
        assert_eq!(wrap_line("hello", 10), vec!["hello"]);
        assert_eq!(wrap_line("hello world!", 5), vec!["hello", " worl", "d!"]);
        assert_eq!(wrap_line("", 5), vec![""]);
        assert_eq!(wrap_line("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_wrap_line_counts_wide_chars() {
        assert_eq!(wrap_line("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn test_idle_screen() {
        let (app, _rx) = create_test_app();
        let rendered = render(&app, Rect::new(0, 0, 100, 30));

        assert!(rendered.contains("[Idle]"));
        assert!(rendered.contains("0 characters"));
        assert!(rendered.contains("Start typing"));
        assert!(rendered.contains("0%"));
        assert!(rendered.contains("(tab) analyze"));
    }

    #[test]
    fn test_recording_screen_shows_text_and_count() {
        let (mut app, _rx) = create_test_app();
        type_into(&mut app, "hello world");
        let rendered = render(&app, Rect::new(0, 0, 100, 30));

        assert!(rendered.contains("[Recording]"));
        assert!(rendered.contains("hello world"));
        assert!(rendered.contains("11 characters"));
        assert!(rendered.contains("10 intervals"));
    }

    #[test]
    fn test_insufficient_data_message_is_shown() {
        let (mut app, _rx) = create_test_app();
        type_into(&mut app, "short");
        app.submit();
        let rendered = render(&app, Rect::new(0, 0, 120, 30));

        assert!(rendered.contains("Please type at least 10 characters"));
    }

    #[test]
    fn test_result_screen() {
        let app = analyzed_app();
        let rendered = render(&app, Rect::new(0, 0, 120, 30));

        assert!(rendered.contains("[Resulted]"));
        assert!(rendered.contains("Happy (NLP)"));
        assert!(rendered.contains("84%"));
        assert!(rendered.contains("Context-Aware"));
        assert!(rendered.contains("analyzed"));
    }

    #[test]
    fn test_locked_screen_shows_spinner() {
        let (mut app, _rx) = create_test_app();
        type_into(&mut app, "waiting on the service");
        app.submit();
        app.on_tick();
        let rendered = render(&app, Rect::new(0, 0, 100, 30));

        assert!(rendered.contains("[Locked]"));
        assert!(rendered.contains(SPINNER[1]));
        assert!(rendered.contains("Analyzing"));
    }

    #[test]
    fn test_multiline_text_renders() {
        let (mut app, _rx) = create_test_app();
        type_into(&mut app, "line one\nline two");
        let rendered = render(&app, Rect::new(0, 0, 80, 30));

        assert!(rendered.contains("line one"));
        assert!(rendered.contains("line two"));
    }

    #[test]
    fn test_long_text_scrolls_to_the_end() {
        let (mut app, _rx) = create_test_app();
        let long = format!("{}THE END", "word ".repeat(400));
        type_into(&mut app, &long);
        let rendered = render(&app, Rect::new(0, 0, 60, 24));

        assert!(rendered.contains("THE END"));
    }

    #[test]
    fn test_extreme_sizes_do_not_panic() {
        let app = analyzed_app();
        for area in [
            Rect::new(0, 0, 10, 5),
            Rect::new(0, 0, 200, 5),
            Rect::new(0, 0, 20, 50),
            Rect::new(0, 0, 300, 100),
        ] {
            let mut buffer = Buffer::empty(area);
            (&app).render(area, &mut buffer);
            assert_eq!(*buffer.area(), area);
        }
    }

    #[test]
    fn test_render_after_reset_shows_idle_readout() {
        let mut app = analyzed_app();
        app.reset();
        let rendered = render(&app, Rect::new(0, 0, 100, 30));

        assert!(rendered.contains("[Idle]"));
        assert!(!rendered.contains("Happy (NLP)"));
        assert!(rendered.contains("0%"));
    }
}
