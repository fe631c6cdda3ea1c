use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One engine RPM value read back from an ECU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpmReading {
    /// Raw value carried in the response (0-255).
    pub rpm: u8,
    /// Interface the response arrived on (e.g., "can0").
    pub interface: String,
    /// Receive timestamp.
    pub received_at: DateTime<Utc>,
}

impl RpmReading {
    pub fn new(rpm: u8, interface: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            rpm,
            interface: interface.into(),
            received_at,
        }
    }
}

impl std::fmt::Display for RpmReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPM at {} of 255", self.rpm)
    }
}
