use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use daymark::calendar::{day_key, GridFill};
use daymark::session::CalendarSession;
use daymark::storage::{resolve_book_path, EventStore, FileStore};
use daymark::ui::run_calendar;

#[derive(Debug, Parser)]
#[command(name = "daymark", about = "Terminal month calendar with per-day notes")]
struct Cli {
	#[arg(long)]
	book: Option<PathBuf>,
	#[arg(long)]
	date: Option<String>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Calendar,
	Init,
	Add {
		#[arg(long)]
		date: String,
		#[arg(long)]
		title: String,
	},
	List {
		#[arg(long)]
		month: Option<String>,
	},
	Remove {
		#[arg(long)]
		date: String,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let book_path = resolve_book_path(cli.book);

	if let Some(Command::Init) = &cli.command {
		if book_path.exists() {
			return Err(format!("book already exists: {}", book_path.display()).into());
		}
		let mut store = FileStore::open(book_path.clone());
		store.save(&[])?;
		println!("initialized book at {}", book_path.display());
		return Ok(());
	}

	let today = Local::now().date_naive();
	let anchor = match &cli.date {
		Some(raw) => Some(parse_day(raw)?),
		None => None,
	};

	let store = FileStore::open(book_path);
	let mut session = CalendarSession::new(store, anchor, today, Some(day_key), GridFill::Overhang)?;

	match cli.command.unwrap_or(Command::Calendar) {
		Command::Calendar => {
			run_calendar(&mut session)?;
		}
		Command::Init => {}
		Command::Add { date, title } => {
			let date = parse_day(&date)?;
			let key = session.key_for(date);
			if let Some(existing) = session.event_for_key(&key) {
				return Err(format!("an event already exists on {date}: {}", existing.title).into());
			}
			session.open_day(date);
			session.save_event(&title)?;
			match session.event_for_key(&key) {
				Some(event) => println!("added event {} on {date}", event.id),
				None => return Err("event title must not be blank".into()),
			}
		}
		Command::List { month } => {
			print_events(&session, month.as_deref())?;
		}
		Command::Remove { date } => {
			let date = parse_day(&date)?;
			let key = session.key_for(date);
			if session.event_for_key(&key).is_none() {
				return Err(format!("no event on {date}").into());
			}
			session.open_day(date);
			session.delete_event()?;
			println!("removed events on {date}");
		}
	}

	Ok(())
}

fn print_events(
	session: &CalendarSession<FileStore>,
	month: Option<&str>,
) -> Result<(), Box<dyn Error>> {
	let prefix = match month {
		Some(raw) => Some(parse_month_prefix(raw)?),
		None => None,
	};

	let mut rows = session
		.events()
		.iter()
		.filter(|event| match &prefix {
			Some(prefix) => event.key.starts_with(prefix),
			None => true,
		})
		.collect::<Vec<_>>();
	rows.sort_by(|left, right| left.key.cmp(&right.key).then_with(|| left.id.cmp(&right.id)));

	if rows.is_empty() {
		println!("no matching events");
		return Ok(());
	}

	for event in rows {
		println!("{} | {} | {}", event.key, event.id, event.title);
	}

	Ok(())
}

fn parse_day(input: &str) -> Result<NaiveDate, Box<dyn Error>> {
	Ok(NaiveDate::parse_from_str(input, "%Y-%m-%d")?)
}

fn parse_month_prefix(input: &str) -> Result<String, Box<dyn Error>> {
	let parsed = NaiveDate::parse_from_str(&format!("{input}-01"), "%Y-%m-%d")?;
	Ok(parsed.format("%Y-%m").to_string())
}
