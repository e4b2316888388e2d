//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own chat session bookkeeping, dashboard rendering and
//! project transfer so route handlers stay focused on protocol translation.

pub mod chat;
pub mod dashboard;
pub mod transfer;
