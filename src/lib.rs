pub mod calendar;
pub mod session;
pub mod storage;
pub mod ui;
