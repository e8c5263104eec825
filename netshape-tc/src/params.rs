//! Link shaping parameters.
//!
//! This module defines the user-facing description of the impairment to apply to a single
//! network interface.

/// The maximum value accepted for [`LinkParameters::packet_loss`].
pub const MAX_PACKET_LOSS: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("packet loss must be at most {MAX_PACKET_LOSS}%, got {0}%")]
    LossOutOfRange(u8),
}

/// The impairment to apply to a network interface.
///
/// Every field is optional in the sense that zero means "absent": no clause is emitted for it.
/// The one exception is `latency`, whose delay clause is always present (as `0ms` when unset)
/// so that later `change` commands always find a netem delay to update.
///
/// # Example
///
/// ```
/// use netshape_tc::params::LinkParameters;
///
/// // A congested mobile uplink: 100ms delay with 10ms of jitter and 5% loss.
/// let mobile = LinkParameters::default().with_latency(100).with_jitter(10).with_packet_loss(5);
///
/// // A narrow but otherwise clean link, capped at 1 Mbit/s.
/// let narrow = LinkParameters { bandwidth: 1_000_000, ..Default::default() };
/// # assert!(mobile.validate().is_ok() && narrow.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LinkParameters {
    /// Delay added to every packet, in milliseconds.
    pub latency: u32,

    /// Variation around `latency`, in milliseconds, following a normal distribution.
    pub jitter: u32,

    /// Rate limit of the netem discipline, in bits per second.
    pub bandwidth: u64,

    /// Rate and ceiling of the default htb class, in bits per second. Only used in classed mode.
    pub upload_bandwidth: u64,

    /// Packet loss in whole percentage points (0 to 100).
    pub packet_loss: u8,
}

impl LinkParameters {
    pub fn with_latency(mut self, latency: u32) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_jitter(mut self, jitter: u32) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_bandwidth(mut self, bandwidth: u64) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    pub fn with_upload_bandwidth(mut self, upload_bandwidth: u64) -> Self {
        self.upload_bandwidth = upload_bandwidth;
        self
    }

    pub fn with_packet_loss(mut self, packet_loss: u8) -> Self {
        self.packet_loss = packet_loss;
        self
    }

    /// Checks the invariants the type system can't express.
    pub fn validate(&self) -> Result<(), Error> {
        if self.packet_loss > MAX_PACKET_LOSS {
            return Err(Error::LossOutOfRange(self.packet_loss));
        }

        Ok(())
    }
}
