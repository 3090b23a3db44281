use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};

use crate::calendar::{DateInfo, DayCell, WEEKDAYS};
use crate::session::{CalendarSession, DayModal};
use crate::storage::EventStore;

const CURSOR_DAY_COLOR: Color = Color::Yellow;
const TODAY_COLOR: Color = Color::LightGreen;
const EVENT_DAY_COLOR: Color = Color::LightYellow;
const FILL_DAY_COLOR: Color = Color::DarkGray;

pub fn run_calendar<S: EventStore>(session: &mut CalendarSession<S>) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, session);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop<S: EventStore>(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	session: &mut CalendarSession<S>,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(session.anchor());

	loop {
		let grid = session.grid();
		app.snap_cursor(&grid, session.anchor());
		terminal.draw(|frame| draw_calendar(frame, &app, session, &grid))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match session.modal() {
					DayModal::Closed => handle_normal_key(&mut app, key.code, session, &grid),
					DayModal::Create { .. } => handle_create_key(&mut app, key.code, session),
					DayModal::Inspect { .. } => handle_inspect_key(&mut app, key.code, session),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_calendar<S: EventStore>(
	frame: &mut Frame,
	app: &App,
	session: &CalendarSession<S>,
	grid: &[DayCell],
) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(10), Constraint::Length(4)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Length(25), Constraint::Min(30)])
		.split(layout[0]);

	render_month_panel(frame, body[0], app, session, grid);
	render_day_panel(frame, body[1], app, session);
	render_footer(frame, layout[1], app, session.modal());

	match session.modal() {
		DayModal::Create {
			date,
			title_required,
			..
		} => render_create_popup(frame, *date, *title_required, &app.input),
		DayModal::Inspect { date, title, .. } => render_inspect_popup(frame, *date, title),
		DayModal::Closed => {}
	}
}

fn render_month_panel<S: EventStore>(
	frame: &mut Frame,
	area: Rect,
	app: &App,
	session: &CalendarSession<S>,
	grid: &[DayCell],
) {
	let mut lines = Vec::new();
	lines.push(Line::from(session.month_label()));
	lines.push(Line::from(weekday_header()));

	for week in grid.chunks(7) {
		let mut spans = Vec::new();
		for cell in week {
			let has_event = session.event_for_key(&cell.key).is_some();
			spans.push(Span::styled(
				format!("{:>2} ", cell.day),
				cell_style(cell, app.cursor_day, has_event),
			));
		}
		lines.push(Line::from(spans));
	}

	let calendar = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Calendar"));
	frame.render_widget(calendar, area);
}

fn render_day_panel<S: EventStore>(frame: &mut Frame, area: Rect, app: &App, session: &CalendarSession<S>) {
	let info = DateInfo::describe(app.cursor_day);
	let month = info.month_facet();
	let week = info.week_facet();
	let year = info.year_facet();

	let mut lines = Vec::new();
	match session.event_for_key(&session.key_for(app.cursor_day)) {
		Some(event) => {
			lines.push(Line::from(vec![
				Span::raw("Event: "),
				Span::styled(
					event.title.clone(),
					Style::default().fg(EVENT_DAY_COLOR).add_modifier(Modifier::BOLD),
				),
			]));
			lines.push(Line::from(Span::styled(
				format!("id {}", event.id),
				Style::default().fg(Color::DarkGray),
			)));
		}
		None => {
			lines.push(Line::from(Span::styled(
				"(no event, press Enter to add one)",
				Style::default().fg(Color::DarkGray),
			)));
		}
	}

	lines.push(Line::from(""));
	lines.push(Line::from(format!(
		"Month: {} days, starts {}",
		month.days_in_month, month.first_weekday
	)));
	lines.push(Line::from(format!(
		"Week: {} - {}",
		week.start_of_week.format("%d %b"),
		week.end_of_week.format("%d %b")
	)));
	lines.push(Line::from(format!(
		"Day {} of {}{}",
		info.date.ordinal(),
		year.days_in_year,
		if year.is_leap_year { " (leap year)" } else { "" }
	)));

	let title = app.cursor_day.format("%A, %d %B %Y").to_string();
	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, modal: &DayModal) {
	let keys = match modal {
		DayModal::Closed => "arrows/hjkl move day | n/N month | r reset | Enter open day | q quit",
		DayModal::Create { .. } => "type title | Enter save | Esc cancel",
		DayModal::Inspect { .. } => "d delete | Esc close",
	};

	let footer = Paragraph::new(vec![Line::from(keys), Line::from(app.status.clone())])
		.block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_create_popup(frame: &mut Frame, date: NaiveDate, title_required: bool, input: &str) {
	let area = centered_rect(52, 30, frame.area());
	frame.render_widget(Clear, area);

	let mut lines = vec![Line::from("Event title:"), Line::from(format!("> {input}"))];
	if title_required {
		lines.push(Line::from(Span::styled(
			"event title is required",
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		)));
	}

	let popup = Paragraph::new(lines).block(
		Block::default()
			.borders(Borders::ALL)
			.title(format!("New event - {}", date.format("%d %B %Y"))),
	);
	frame.render_widget(popup, area);
}

fn render_inspect_popup(frame: &mut Frame, date: NaiveDate, title: &str) {
	let area = centered_rect(52, 30, frame.area());
	frame.render_widget(Clear, area);

	let lines = vec![
		Line::from(Span::styled(
			title.to_string(),
			Style::default().add_modifier(Modifier::BOLD),
		)),
		Line::from(""),
		Line::from(Span::styled(
			"d delete | Esc close",
			Style::default().fg(Color::DarkGray),
		)),
	];

	let popup = Paragraph::new(lines).block(
		Block::default()
			.borders(Borders::ALL)
			.title(format!("Event - {}", date.format("%d %B %Y"))),
	);
	frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key<S: EventStore>(
	app: &mut App,
	code: KeyCode,
	session: &mut CalendarSession<S>,
	grid: &[DayCell],
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Up | KeyCode::Char('k') => {
			shift_cursor(app, session, grid, -7);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			shift_cursor(app, session, grid, 7);
			false
		}
		KeyCode::Left | KeyCode::Char('h') => {
			shift_cursor(app, session, grid, -1);
			false
		}
		KeyCode::Right | KeyCode::Char('l') => {
			shift_cursor(app, session, grid, 1);
			false
		}
		KeyCode::Char('n') => {
			session.move_view(1);
			app.cursor_day = session.anchor();
			false
		}
		KeyCode::Char('N') => {
			session.move_view(-1);
			app.cursor_day = session.anchor();
			false
		}
		KeyCode::Char('r') => {
			session.reset_view();
			app.cursor_day = session.anchor();
			app.status = "View reset".to_string();
			false
		}
		KeyCode::Enter => {
			app.input.clear();
			session.open_day(app.cursor_day);
			false
		}
		_ => false,
	}
}

fn shift_cursor<S: EventStore>(
	app: &mut App,
	session: &mut CalendarSession<S>,
	grid: &[DayCell],
	delta_days: i64,
) {
	app.cursor_day += Duration::days(delta_days);

	if let (Some(first), Some(last)) = (grid.first(), grid.last()) {
		if app.cursor_day < first.date {
			session.move_view(-1);
		} else if app.cursor_day > last.date {
			session.move_view(1);
		}
	}
}

fn handle_create_key<S: EventStore>(app: &mut App, code: KeyCode, session: &mut CalendarSession<S>) -> bool {
	match code {
		KeyCode::Esc => {
			session.close_modal();
			app.input.clear();
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			app.input.pop();
		}
		KeyCode::Char(value) => {
			app.input.push(value);
		}
		KeyCode::Enter => {
			let title = app.input.trim().to_string();
			match session.save_event(&app.input) {
				Ok(()) => match session.modal() {
					DayModal::Create { .. } => {
						app.status = "event title is required".to_string();
					}
					_ => {
						app.input.clear();
						app.status = format!("saved event: {title}");
					}
				},
				Err(err) => {
					app.input.clear();
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_inspect_key<S: EventStore>(app: &mut App, code: KeyCode, session: &mut CalendarSession<S>) -> bool {
	match code {
		KeyCode::Char('d') => {
			let title = match session.modal() {
				DayModal::Inspect { title, .. } => title.clone(),
				_ => String::new(),
			};
			match session.delete_event() {
				Ok(()) => app.status = format!("deleted event: {title}"),
				Err(err) => app.status = format!("error: {err}"),
			}
		}
		KeyCode::Esc | KeyCode::Enter => {
			session.close_modal();
		}
		_ => {}
	}

	false
}

fn cell_style(cell: &DayCell, cursor_day: NaiveDate, has_event: bool) -> Style {
	if cell.date == cursor_day {
		Style::default()
			.fg(Color::Black)
			.bg(CURSOR_DAY_COLOR)
			.add_modifier(Modifier::BOLD)
	} else if cell.is_today {
		Style::default().fg(TODAY_COLOR).add_modifier(Modifier::BOLD)
	} else if has_event {
		Style::default().fg(EVENT_DAY_COLOR).add_modifier(Modifier::BOLD)
	} else if !cell.in_view_month {
		Style::default().fg(FILL_DAY_COLOR)
	} else {
		Style::default()
	}
}

fn weekday_header() -> String {
	WEEKDAYS
		.iter()
		.map(|name| &name[..2])
		.collect::<Vec<_>>()
		.join(" ")
}

struct App {
	cursor_day: NaiveDate,
	input: String,
	status: String,
}

impl App {
	fn new(cursor_day: NaiveDate) -> Self {
		Self {
			cursor_day,
			input: String::new(),
			status: "Ready".to_string(),
		}
	}

	fn snap_cursor(&mut self, grid: &[DayCell], anchor: NaiveDate) {
		if !grid.iter().any(|cell| cell.date == self.cursor_day) {
			self.cursor_day = anchor;
		}
	}
}
