use std::cell::OnceCell;

use chrono::{Datelike, Duration, NaiveDate};

pub const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub type KeyFormatter = fn(NaiveDate) -> String;

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn timestamp_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00.000Z").to_string()
}

pub fn month_label(anchor: NaiveDate) -> String {
    anchor.format("%B %Y").to_string()
}

pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[weekday_index(date)]
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

// Month overflow wraps the year in either direction; day 0 resolves to the
// last day of the previous month and days past the end roll forward.
pub fn resolve_date(year: i32, month0: i32, day: i64) -> NaiveDate {
    let months = year as i64 * 12 + month0 as i64;
    let resolved_year = months.div_euclid(12) as i32;
    let resolved_month = months.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(resolved_year, resolved_month, 1)
        .expect("normalized month must be valid");
    first + Duration::days(day - 1)
}

#[derive(Debug)]
pub struct DateInfo {
    pub date: NaiveDate,
    pub day: u32,
    pub month0: u32,
    pub year: i32,
    pub weekday: &'static str,
    pub weekday_index: usize,
    month_memo: OnceCell<MonthFacet>,
    week_memo: OnceCell<WeekFacet>,
    year_memo: OnceCell<YearFacet>,
}

impl DateInfo {
    pub fn describe(date: NaiveDate) -> Self {
        Self {
            date,
            day: date.day(),
            month0: date.month0(),
            year: date.year(),
            weekday: weekday_name(date),
            weekday_index: weekday_index(date),
            month_memo: OnceCell::new(),
            week_memo: OnceCell::new(),
            year_memo: OnceCell::new(),
        }
    }

    pub fn month_facet(&self) -> &MonthFacet {
        self.month_memo
            .get_or_init(|| MonthFacet::compute(self.year, self.month0))
    }

    pub fn week_facet(&self) -> &WeekFacet {
        self.week_memo.get_or_init(|| WeekFacet::compute(self))
    }

    pub fn year_facet(&self) -> &YearFacet {
        self.year_memo.get_or_init(|| YearFacet::compute(self.year))
    }
}

#[derive(Debug, Clone)]
pub struct MonthBoundary {
    pub date: NaiveDate,
    pub day: u32,
    pub weekday: &'static str,
    pub weekday_index: usize,
    pub month0: u32,
    pub year: i32,
}

impl MonthBoundary {
    fn at(date: NaiveDate) -> Self {
        Self {
            date,
            day: date.day(),
            weekday: weekday_name(date),
            weekday_index: weekday_index(date),
            month0: date.month0(),
            year: date.year(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonthFacet {
    pub first_day: NaiveDate,
    pub first_weekday: &'static str,
    pub first_weekday_index: usize,
    pub days_in_month: u32,
    pub month_before: MonthBoundary,
    pub padding_days_before: usize,
    pub month_after: MonthBoundary,
    pub padding_days_after: usize,
}

impl MonthFacet {
    fn compute(year: i32, month0: u32) -> Self {
        let month0 = month0 as i32;
        let first_day = resolve_date(year, month0, 1);
        let days_in_month = resolve_date(year, month0 + 1, 0).day();
        let month_before = MonthBoundary::at(resolve_date(year, month0, 0));
        let month_after = MonthBoundary::at(resolve_date(year, month0 + 1, 1));
        let padding_days_before = month_before.weekday_index;
        let padding_days_after = WEEKDAYS.len() - 1 - month_after.weekday_index;

        Self {
            first_day,
            first_weekday: weekday_name(first_day),
            first_weekday_index: weekday_index(first_day),
            days_in_month,
            month_before,
            padding_days_before,
            month_after,
            padding_days_after,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeekEntry {
    pub weekday: &'static str,
    pub day: u32,
    pub month0: u32,
    pub year: i32,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct WeekFacet {
    pub start_of_week: NaiveDate,
    pub end_of_week: NaiveDate,
    pub days: Vec<WeekEntry>,
}

impl WeekFacet {
    fn compute(info: &DateInfo) -> Self {
        let offset = info.weekday_index as i64;
        let days = (0..WEEKDAYS.len())
            .map(|slot| {
                let date = resolve_date(
                    info.year,
                    info.month0 as i32,
                    info.day as i64 - offset + slot as i64,
                );
                WeekEntry {
                    weekday: WEEKDAYS[slot],
                    day: date.day(),
                    month0: date.month0(),
                    year: date.year(),
                    date,
                }
            })
            .collect::<Vec<_>>();

        Self {
            start_of_week: days[0].date,
            end_of_week: days[WEEKDAYS.len() - 1].date,
            days,
        }
    }
}

#[derive(Debug, Clone)]
pub struct YearFacet {
    pub is_leap_year: bool,
    pub first_day: NaiveDate,
    pub first_weekday: &'static str,
    pub first_weekday_index: usize,
    pub last_day: NaiveDate,
    pub last_weekday: &'static str,
    pub last_weekday_index: usize,
    pub days_in_year: u32,
}

impl YearFacet {
    fn compute(year: i32) -> Self {
        let is_leap_year = is_leap_year(year);
        let first_day = resolve_date(year, 0, 1);
        let last_day = resolve_date(year + 1, 0, 0);

        Self {
            is_leap_year,
            first_day,
            first_weekday: weekday_name(first_day),
            first_weekday_index: weekday_index(first_day),
            last_day,
            last_weekday: weekday_name(last_day),
            last_weekday_index: weekday_index(last_day),
            days_in_year: if is_leap_year { 366 } else { 365 },
        }
    }
}

// Overhang renders one cell beyond each stored padding count, which keeps
// the grid a multiple of seven and starts every row on Sunday. Exact
// renders the stored counts alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridFill {
    #[default]
    Overhang,
    Exact,
}

impl GridFill {
    fn extra_cells(self) -> usize {
        match self {
            GridFill::Overhang => 1,
            GridFill::Exact => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub in_view_month: bool,
    pub is_today: bool,
    pub key: String,
}

pub fn build_month_grid(
    anchor: NaiveDate,
    today: NaiveDate,
    key_format: KeyFormatter,
    fill: GridFill,
) -> Vec<DayCell> {
    let info = DateInfo::describe(anchor);
    let facet = info.month_facet();
    let mut cells = Vec::with_capacity(facet.days_in_month as usize + 16);

    let before = &facet.month_before;
    let leading = facet.padding_days_before + fill.extra_cells();
    let leading_start = before.day as i64 - leading as i64 + 1;
    for slot in 0..leading {
        let date = resolve_date(before.year, before.month0 as i32, leading_start + slot as i64);
        cells.push(day_cell(date, false, today, key_format));
    }

    for day in 1..=facet.days_in_month {
        let date = resolve_date(info.year, info.month0 as i32, day as i64);
        cells.push(day_cell(date, true, today, key_format));
    }

    let after = &facet.month_after;
    let trailing = facet.padding_days_after + fill.extra_cells();
    for day in 1..=trailing {
        let date = resolve_date(after.year, after.month0 as i32, day as i64);
        cells.push(day_cell(date, false, today, key_format));
    }

    cells
}

fn day_cell(
    date: NaiveDate,
    in_view_month: bool,
    today: NaiveDate,
    key_format: KeyFormatter,
) -> DayCell {
    DayCell {
        date,
        day: date.day(),
        in_view_month,
        is_today: date == today,
        key: key_format(date),
    }
}

#[derive(Debug, Clone)]
pub struct MonthCursor {
    current: NaiveDate,
    initial: NaiveDate,
}

impl MonthCursor {
    pub fn new(explicit: Option<NaiveDate>, today: NaiveDate) -> Self {
        let initial = explicit.unwrap_or(today);
        Self {
            current: initial,
            initial,
        }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    pub fn initial(&self) -> NaiveDate {
        self.initial
    }

    pub fn move_by(&mut self, delta_months: i32) -> NaiveDate {
        self.current = resolve_date(
            self.current.year(),
            self.current.month0() as i32 + delta_months,
            self.current.day() as i64,
        );
        self.current
    }

    pub fn reset(&mut self) -> NaiveDate {
        self.current = self.initial;
        self.current
    }
}
