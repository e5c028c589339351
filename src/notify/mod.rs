//! Alert formatting and delivery
//!
//! This module provides:
//! - Notification payloads and their HTML rendering with deep links
//! - The Telegram delivery channel with transparent chat-migration handling

mod message;
mod telegram;

pub use message::{render, Alert, AlertKind, MessageTemplates, MAX_MESSAGE_LENGTH};
pub use telegram::{NotifyError, TelegramNotifier};
