use ratatui::{
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::status::LoopState;
use crate::tui::app::{capitalize, whole_percent, App};

pub fn draw(f: &mut Frame, app: &App) {
    if let Some(reason) = app.load_failure() {
        draw_load_failure(f, reason, f.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_live_panel(f, app, content_chunks[0]);
    draw_side_panel(f, app, content_chunks[1]);

    if app.is_loading() {
        draw_loading_popup(f, f.area());
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let (state, color) = match app.status.state {
        LoopState::Idle => ("IDLE", Color::Gray),
        LoopState::Requesting => ("STARTING", Color::Yellow),
        LoopState::Active => ("LIVE", Color::Green),
    };
    let action = if app.is_loading() {
        "Loading Model..."
    } else if app.status.state == LoopState::Idle {
        "Start Camera"
    } else {
        "Stop Camera"
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " VisionLite - Real-time Detection ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("[{state}]"), Style::default().fg(color)),
        Span::raw(" | "),
        Span::styled("[S]", Style::default().fg(Color::Green)),
        Span::raw(format!(" {action} ")),
        Span::styled("[Q]", Style::default().fg(Color::Red)),
        Span::raw("uit"),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn draw_live_panel(f: &mut Frame, app: &App, area: Rect) {
    let status = &app.status;
    let mut lines = Vec::new();

    if let Some(err) = &status.capture_error {
        lines.push(Line::from(Span::styled(
            "Camera Access Error",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            err.as_str(),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(""));
    }

    match status.state {
        LoopState::Idle if status.capture_error.is_none() => {
            lines.push(Line::from(Span::styled(
                "Ready to Detect",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(
                "Press [S] to start the camera and begin real-time object detection",
            ));
        }
        LoopState::Idle => {
            lines.push(Line::from("Press [S] to try again"));
        }
        LoopState::Requesting => {
            lines.push(Line::from("Requesting camera access..."));
        }
        LoopState::Active => {
            let size = status
                .frame_dims
                .map(|d| d.to_string())
                .unwrap_or_else(|| "waiting for frames".to_string());
            lines.push(Line::from(vec![
                Span::styled("● LIVE ", Style::default().fg(Color::Red)),
                Span::raw(format!("{} FPS | {size}", status.fps)),
            ]));
        }
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Camera"));
    f.render_widget(paragraph, area);
}

fn draw_side_panel(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(7),
            Constraint::Length(5),
        ])
        .split(area);

    draw_stats(f, app, chunks[0]);
    draw_detections(f, app, chunks[1]);
    draw_model_info(f, app, chunks[2]);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let text = vec![
        Line::from(format!("  Frames/sec: {}", app.status.fps)),
        Line::from(format!("  Objects:    {}", app.status.top.len())),
    ];
    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Detection Stats"),
    );
    f.render_widget(paragraph, area);
}

fn draw_detections(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Detected Objects");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.status.top.is_empty() {
        let empty = Paragraph::new("No objects detected yet")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(empty, inner);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); app.status.top.len()])
        .split(inner);
    for (detection, row) in app.status.top.iter().zip(rows.iter()) {
        let percent = whole_percent(detection.confidence);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green))
            .label(format!("{} {percent}%", capitalize(&detection.label)))
            .percent(percent);
        f.render_widget(gauge, *row);
    }
}

fn draw_model_info(f: &mut Frame, app: &App, area: Rect) {
    let (architecture, framework, dataset) = match &app.status.model_info {
        Some(info) => (
            info.architecture.as_str(),
            info.framework.as_str(),
            info.dataset.as_str(),
        ),
        None => ("-", "-", "-"),
    };
    let text = vec![
        Line::from(format!("  Architecture: {architecture}")),
        Line::from(format!("  Framework:    {framework}")),
        Line::from(format!("  Dataset:      {dataset}")),
    ];
    let paragraph =
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Model Info"));
    f.render_widget(paragraph, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn draw_loading_popup(f: &mut Frame, area: Rect) {
    let popup = centered(area, 44, 5);
    let text = vec![
        Line::from(Span::styled(
            "Loading AI Model",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("Initializing YOLOv8 on ONNX Runtime..."),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn draw_load_failure(f: &mut Frame, reason: &str, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "Failed to load model",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(reason),
        Line::from(""),
        Line::from("Fix the model path and restart. Press [Q] to quit."),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("VisionLite"));
    f.render_widget(paragraph, area);
}
