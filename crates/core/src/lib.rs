// crates/core/src/lib.rs

//! Leaf components of the calendar assistant: model client, date/time
//! resolution, tool catalog, tool-call parsing and execution, and the
//! calendar store backends.

pub mod ai_client;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod datetime;
pub mod error;
pub mod executor;
pub mod google;
pub mod openai_client;
pub mod parser;
