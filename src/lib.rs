//! Watchdesk — support assistant for trade-surveillance teams.
//!
//! Turns free-text inquiries into structured fields, matches them against an
//! indexed catalog of detection configs and test definitions, previews
//! parameter changes without touching any file, and runs matched tests
//! through an external runner with a mandatory timeout.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub mod catalog;
pub mod inquiry;
pub mod params;
pub mod runner;
pub mod search;

pub mod agent;
pub mod tools;
