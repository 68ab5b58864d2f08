//! Log-based publisher adapter.
//!
//! Implements [`Publisher`] by writing each outbound message to the
//! ESP-IDF logger (UART / USB-CDC).  Used when no broker URL is configured,
//! and as the host stand-in for the MQTT adapter.

use log::info;

use crate::app::ports::Publisher;
use crate::error::CommsError;

#[derive(Debug, Default)]
pub struct LogPublisher {
    published: u32,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged so far.
    pub fn published(&self) -> u32 {
        self.published
    }
}

impl Publisher for LogPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let text = core::str::from_utf8(payload).map_err(|_| CommsError::EncodeFailed)?;
        info!("PUB | {} | {}", topic, text);
        self.published = self.published.wrapping_add(1);
        Ok(())
    }
}
