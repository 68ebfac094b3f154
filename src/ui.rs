use anyhow::Result;
use bazi_fortune::{chart_for_solar, tally_pillars, HistoryRecord, Statistics};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_SIZE: usize = 10;

pub struct App {
    pub records: Vec<HistoryRecord>,
    pub stats: Statistics,
    pub state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(records: Vec<HistoryRecord>) -> Self {
        let stats = Statistics::from_records(&records);
        let mut state = TableState::default();
        if !records.is_empty() {
            // Newest record is the most interesting one to land on.
            state.select(Some(records.len() - 1));
        }

        Self {
            records,
            stats,
            state,
            show_detail: false,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_record(&self) -> Option<&HistoryRecord> {
        self.state.selected().and_then(|i| self.records.get(i))
    }

    pub fn next(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = self.state.selected().unwrap_or(0) + PAGE_SIZE;
        self.state.select(Some(i.min(self.records.len() - 1)));
    }

    pub fn page_up(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = self.state.selected().unwrap_or(0).saturating_sub(PAGE_SIZE);
        self.state.select(Some(i));
    }

    pub fn first(&mut self) {
        if !self.records.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        if !self.records.is_empty() {
            self.state.select(Some(self.records.len() - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Statistics header
            Constraint::Min(0),    // History table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn score_color(score: u8) -> Color {
    match score {
        70..=100 => Color::Green,
        40..=69 => Color::Yellow,
        _ => Color::Red,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let spans = vec![
        Span::styled(
            "八字运势 History",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", app.stats.total),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Avg fortune: {:.1}", app.stats.avg_fortune),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Avg wealth: {:.1}", app.stats.avg_wealth),
            Style::default().fg(Color::Green),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Queried at", "Birth date", "Fortune", "Wealth"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.records.iter().map(|record| {
        let cells = vec![
            Cell::from(record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::from(record.birth_date.to_string()),
            Cell::from(record.fortune.to_string())
                .style(Style::default().fg(score_color(record.fortune))),
            Cell::from(record.wealth.to_string())
                .style(Style::default().fg(score_color(record.wealth))),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(21),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Queries "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let status = Line::from(vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.records.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" │ "),
        Span::styled("↑↓/jk", Style::default().fg(Color::Yellow)),
        Span::raw(" move  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" detail  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);

    let status_bar = Paragraph::new(status).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(record) = app.selected_record() else {
        let empty = Paragraph::new("No query selected")
            .block(Block::default().borders(Borders::ALL).title(" Detail "));
        f.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut content = vec![
        Line::from(vec![
            Span::styled("Birth date: ", label),
            Span::raw(record.birth_date.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Fortune:    ", label),
            Span::styled(
                record.fortune.to_string(),
                Style::default().fg(score_color(record.fortune)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Wealth:     ", label),
            Span::styled(
                record.wealth.to_string(),
                Style::default().fg(score_color(record.wealth)),
            ),
        ]),
        Line::from(""),
    ];

    // The log does not keep the birth hour, so only the date pillars are shown.
    match chart_for_solar(record.birth_date, 0) {
        Ok((lunar, chart)) => {
            content.push(Line::from(vec![
                Span::styled("Lunar date: ", label),
                Span::raw(lunar.to_string()),
            ]));
            content.push(Line::from(vec![
                Span::styled("Pillars:    ", label),
                Span::styled(
                    format!("{} {} {} --", chart.year, chart.month, chart.day),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));

            let counts: Vec<Span> = tally_pillars(&[chart.year, chart.month, chart.day])
                .iter()
                .map(|(element, n)| Span::raw(format!("{}{} ", element, n)))
                .collect();
            content.push(Line::from(
                std::iter::once(Span::styled("Elements:   ", label))
                    .chain(counts)
                    .collect::<Vec<_>>(),
            ));
            content.push(Line::from(Span::styled(
                "(date pillars only, hour unknown)",
                label,
            )));
        }
        Err(e) => content.push(Line::from(Span::styled(
            e.to_string(),
            Style::default().fg(Color::Red),
        ))),
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Detail "),
    );

    f.render_widget(panel, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn app_with(n: u32) -> App {
        let records = (1..=n)
            .map(|d| HistoryRecord::new(NaiveDate::from_ymd_opt(1990, 1, d).unwrap(), 50, 50))
            .collect();
        App::new(records)
    }

    #[test]
    fn test_starts_on_newest_record() {
        let app = app_with(5);
        assert_eq!(app.state.selected(), Some(4));
        assert_eq!(app.stats.total, 5);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app_with(3);
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(2));
    }

    #[test]
    fn test_paging_clamps() {
        let mut app = app_with(25);
        app.first();
        app.page_down();
        assert_eq!(app.state.selected(), Some(10));
        app.page_down();
        app.page_down();
        assert_eq!(app.state.selected(), Some(24));
        app.page_up();
        assert_eq!(app.state.selected(), Some(14));
    }

    #[test]
    fn test_empty_history() {
        let mut app = app_with(0);
        app.next();
        app.page_down();
        assert!(app.selected_record().is_none());
    }
}
