//! # prompt-sync
//!
//! Keep an OpenAI assistant's instructions synchronized with the current
//! state of a set of watched source locations and, optionally, a live
//! MySQL/Postgres schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐
//! │ notify   │──▶│ Coalescer │──▶│  Snapshot   │──▶│ Assistant │
//! │ + tick   │   │ (throttle)│   │ (files+DB) │   │  API push │
//! └──────────┘   └───────────┘   └────────────┘   └───────────┘
//! ```
//!
//! Raw filesystem events and a fixed 30-second tick feed the coalescer,
//! which collapses bursts into at most one in-flight sync per throttle
//! interval. Each sync assembles a fresh snapshot — preamble, optional
//! schema dump, then every watched file — and overwrites the assistant's
//! `instructions` field.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and startup validation |
//! | [`aggregate`] | Watch-target expansion and concurrent file reads |
//! | [`schema`] | MySQL/Postgres schema dumps |
//! | [`snapshot`] | Instruction payload assembly |
//! | [`coalesce`] | Throttled sync state machine |
//! | [`watcher`] | Filesystem event source |
//! | [`assistant`] | Assistants API client |
//! | [`sync`] | Cycle orchestration and the watch loop |

pub mod aggregate;
pub mod assistant;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod schema;
pub mod snapshot;
pub mod sync;
pub mod watcher;
