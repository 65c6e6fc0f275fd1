use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use strum::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum MessageType {
    Error,
    Warning,
    Info,
    Priority,
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub timestamp: DateTime<Utc>,
    pub message_type: MessageType,
    pub content: String,
}

impl StatusMessage {
    pub fn new(message_type: MessageType, content: String) -> Self {
        StatusMessage {
            timestamp: Utc::now(),
            message_type,
            content,
        }
    }
}

/// Bounded log of session events, shared between the capture and command threads.
/// Every message is mirrored to `tracing`.
pub struct MessageLog {
    messages: Mutex<VecDeque<StatusMessage>>,
    max_size: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        MessageLog::new(None)
    }
}

impl MessageLog {
    pub fn new(max_size: Option<usize>) -> Self {
        MessageLog {
            messages: Mutex::new(VecDeque::new()),
            max_size: max_size.unwrap_or(500).max(1),
        }
    }

    pub fn add_message(&self, message: StatusMessage) {
        match message.message_type {
            MessageType::Error => tracing::error!("{}", message.content),
            MessageType::Warning => tracing::warn!("{}", message.content),
            MessageType::Priority => tracing::info!(priority = true, "{}", message.content),
            MessageType::Info => tracing::info!("{}", message.content),
        }

        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        if messages.len() == self.max_size {
            messages.pop_front();
        }
        messages.push_back(message);
    }

    pub fn info(&self, content: String) {
        self.add_message(StatusMessage::new(MessageType::Info, content));
    }

    pub fn warning(&self, content: String) {
        self.add_message(StatusMessage::new(MessageType::Warning, content));
    }

    pub fn error(&self, content: String) {
        self.add_message(StatusMessage::new(MessageType::Error, content));
    }

    pub fn priority(&self, content: String) {
        self.add_message(StatusMessage::new(MessageType::Priority, content));
    }

    /// The newest `count` messages, oldest first.
    pub fn get_recent_messages(&self, count: usize) -> Vec<StatusMessage> {
        let messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        let skip = messages.len().saturating_sub(count);
        messages.iter().skip(skip).cloned().collect()
    }

    pub fn get_all_messages(&self) -> Vec<StatusMessage> {
        let messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        messages.iter().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
