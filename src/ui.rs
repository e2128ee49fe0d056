use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::state::{AppState, DatasetStatus};

const HELP_TEXT: &str = "\
mouse: hover / click a governorate
arrows: pan   +/-: zoom   0: home
r: reload (new colors)
Esc: close popup   q: quit";

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(f.area());

    // Map
    let title = match state.hovered_name() {
        Some(name) => format!("Egypt: {name}"),
        None => "Egypt".to_string(),
    };
    state.canvas.render(f, chunks[0], &title);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(30),
            Constraint::Percentage(35),
        ])
        .split(chunks[1]);

    // Popup
    let popup = match state.canvas.popup() {
        Some(p) => {
            let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
            let lines = p.lines().enumerate().map(|(i, l)| match i {
                0 => Line::styled(l.to_string(), heading),
                _ => Line::raw(l.to_string()),
            });
            Text::from(lines.collect::<Vec<_>>())
        }
        None => Text::raw("Click a governorate to see its details"),
    };
    f.render_widget(
        Paragraph::new(popup)
            .block(Block::default().borders(Borders::ALL).title("Governorate"))
            .wrap(Wrap { trim: true }),
        right[0],
    );

    // Dataset
    let (status, color) = match &state.status {
        DatasetStatus::Loading => ("loading…".to_string(), Color::Yellow),
        DatasetStatus::Ready(n) => (format!("{n} regions"), Color::Green),
        DatasetStatus::Unavailable(why) => {
            (format!("unavailable: {why} (base map only)"), Color::Red)
        }
    };
    let view = state.canvas.viewport().center();
    let mut lines = vec![
        Line::raw(state.config().dataset.display().to_string()),
        Line::styled(status, Style::default().fg(color)),
        Line::raw(format!("view {:.2}°E {:.2}°N", view.x, view.y)),
    ];
    if let Some(feature) = state.hovered_feature() {
        let fill = feature.current_style().fill_color;
        lines.push(Line::styled(
            format!("■ {} {fill}", feature.region().id),
            Style::default().fg(fill.into()),
        ));
    }
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("Dataset"))
            .wrap(Wrap { trim: true }),
        right[1],
    );

    // Keys
    f.render_widget(
        Paragraph::new(HELP_TEXT)
            .block(Block::default().borders(Borders::ALL).title("Keys"))
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: true }),
        right[2],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AtlasConfig, data::tests::TWO_GOVERNORATES, interaction::PointerEvent};
    use ratatui::{Terminal, backend::TestBackend};
    use std::{
        fs, thread,
        time::{Duration, Instant},
    };

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn side_panels_show_popup_and_hovered_region() {
        let path = std::env::temp_dir()
            .join(format!("egypt-atlas-ui-{}.geojson", std::process::id()));
        fs::write(&path, TWO_GOVERNORATES).unwrap();
        let config = AtlasConfig { dataset: path.clone(), ..AtlasConfig::default() };
        let mut app = AppState::new(config);
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.status == DatasetStatus::Loading {
            assert!(Instant::now() < deadline, "dataset never arrived");
            thread::sleep(Duration::from_millis(5));
            app.tick();
        }

        app.layers.handle(1, PointerEvent::Click, &mut app.canvas).unwrap();
        app.hovered = Some(1);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Luxor"));
        assert!(text.contains("2 regions"));
        assert!(text.contains("view"));
        let _ = fs::remove_file(path);
    }
}
