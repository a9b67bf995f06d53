//! serial-panel: send letters, words and commands to a microcontroller over
//! a serial link, from a terminal control panel or the command line.

pub mod codec;
pub mod config;
pub mod error;
pub mod input;
pub mod logbook;
pub mod report;
pub mod session;
pub mod transport;
pub mod tui;
pub mod types;
