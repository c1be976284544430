//! Shutter Gateway - voice-assistant bridge for motorized roller shutters
//!
//! This library provides:
//! - Smart home directive routing (discovery, state reports, mode/range
//!   control, scene activation)
//! - A conversational skill for setup and whole-home open/close
//! - Idempotent setup-code issuance backed by `SQLite`
//! - An HTTP client for the home-automation backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Voice-assistant host                    │
//! │        Smart home directives  │  Skill requests      │
//! └────────────────────┬────────────────────────────────┘
//!                      │  POST /invoke
//! ┌────────────────────▼────────────────────────────────┐
//! │               Shutter Gateway                        │
//! │   InvocationHandler → SmartHomeRouter | SkillHandler │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │           Home-automation backend                    │
//! │   homesdata  │  homestatus  │  setstate (scenarios)  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod handler;
pub mod locale;
pub mod security;
pub mod session;
pub mod skill;
pub mod smarthome;

pub use backend::{Backend, BackendSession, DeviceRecord, DeviceState, HttpBackend, Scenario};
pub use config::Config;
pub use daemon::Daemon;
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use handler::{InvocationContext, InvocationHandler};
pub use locale::Locale;
pub use security::{SetupTokenService, TokenStore};
pub use session::SessionContext;
pub use skill::SkillHandler;
pub use smarthome::{RouteOutcome, SmartHomeRouter};
