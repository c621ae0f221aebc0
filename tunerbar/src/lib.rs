//! tunerbar: companion front-end for the EpgTimerSrv recording scheduler.
//!
//! Polls reservations, the program guide, tuner bindings and recorded files,
//! renders them as channel, reservation, recorded and tuner lists, and
//! launches or closes a TV viewer around reservation start and end times.

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod state;
pub mod status;
pub mod ticker;
pub mod view;
pub mod viewer;
pub mod weblink;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use error::{AppError, Result};
