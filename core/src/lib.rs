//! Core library for reps: workout models, the progress engine (streaks,
//! weekly targets, XP, achievements, day timeline), SQLite storage and the
//! service layer shared by the CLI and the REST API.

pub mod achievements;
pub mod blob;
pub mod calendar;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod reminders;
pub mod service;
pub mod store;
pub mod streak;
pub mod timeline;
pub mod weekly;
pub mod xp;
