use chrono::NaiveDate;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

use crate::calendar::{self, build_month_grid, DayCell, GridFill, KeyFormatter, MonthCursor};
use crate::storage::{EventStore, StoreError};

const ID_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEvent {
    pub id: String,
    pub key: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayModal {
    Closed,
    Create {
        date: NaiveDate,
        key: String,
        title_required: bool,
    },
    Inspect {
        date: NaiveDate,
        key: String,
        event_id: String,
        title: String,
    },
}

pub struct CalendarSession<S: EventStore> {
    store: S,
    events: Vec<DayEvent>,
    cursor: MonthCursor,
    today: NaiveDate,
    key_format: KeyFormatter,
    fill: GridFill,
    clicked_day: Option<NaiveDate>,
    modal: DayModal,
}

impl<S: EventStore> CalendarSession<S> {
    pub fn new(
        mut store: S,
        explicit_anchor: Option<NaiveDate>,
        today: NaiveDate,
        key_format: Option<KeyFormatter>,
        fill: GridFill,
    ) -> Result<Self, StoreError> {
        let events = store.load()?;
        Ok(Self {
            store,
            events,
            cursor: MonthCursor::new(explicit_anchor, today),
            today,
            key_format: key_format.unwrap_or(calendar::timestamp_key),
            fill,
            clicked_day: None,
            modal: DayModal::Closed,
        })
    }

    pub fn grid(&self) -> Vec<DayCell> {
        build_month_grid(self.cursor.current(), self.today, self.key_format, self.fill)
    }

    pub fn month_label(&self) -> String {
        calendar::month_label(self.cursor.current())
    }

    pub fn anchor(&self) -> NaiveDate {
        self.cursor.current()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn key_for(&self, date: NaiveDate) -> String {
        (self.key_format)(date)
    }

    pub fn modal(&self) -> &DayModal {
        &self.modal
    }

    pub fn clicked_day(&self) -> Option<NaiveDate> {
        self.clicked_day
    }

    pub fn events(&self) -> &[DayEvent] {
        &self.events
    }

    pub fn event_for_key(&self, key: &str) -> Option<&DayEvent> {
        self.events.iter().find(|event| event.key == key)
    }

    pub fn open_day(&mut self, date: NaiveDate) {
        let key = (self.key_format)(date);
        let existing = self
            .event_for_key(&key)
            .map(|event| (event.id.clone(), event.title.clone()));
        self.clicked_day = Some(date);
        self.modal = match existing {
            Some((event_id, title)) => DayModal::Inspect {
                date,
                key,
                event_id,
                title,
            },
            None => DayModal::Create {
                date,
                key,
                title_required: false,
            },
        };
    }

    pub fn save_event(&mut self, title: &str) -> Result<(), StoreError> {
        match &mut self.modal {
            DayModal::Create {
                key,
                title_required,
                ..
            } => {
                let title = title.trim();
                if title.is_empty() {
                    *title_required = true;
                    return Ok(());
                }
                let event = DayEvent {
                    id: generate_id(),
                    key: key.clone(),
                    title: title.to_string(),
                };
                self.events.push(event);
                self.close_modal();
                self.store.save(&self.events)
            }
            _ => Ok(()),
        }
    }

    pub fn delete_event(&mut self) -> Result<(), StoreError> {
        match &self.modal {
            DayModal::Inspect { key, .. } => {
                let key = key.clone();
                self.events.retain(|event| event.key != key);
                self.close_modal();
                self.store.save(&self.events)
            }
            _ => Ok(()),
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = DayModal::Closed;
        self.clicked_day = None;
    }

    pub fn move_view(&mut self, delta_months: i32) -> NaiveDate {
        self.close_modal();
        self.cursor.move_by(delta_months)
    }

    pub fn reset_view(&mut self) -> NaiveDate {
        self.close_modal();
        self.cursor.reset()
    }
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}
