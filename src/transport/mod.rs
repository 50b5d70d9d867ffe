//! Charge transport: discrete visual carriers animated by solved currents.
//!
//! Everything here is presentation-side bookkeeping; the engine reads
//! currents and never writes anything the solver sees.

mod carrier;
mod engine;

pub use carrier::{Carrier, TransportElement};
pub use engine::{ChargeTransport, CHARGE_SEPARATION, DEFAULT_SPEED_SCALE, MINIMUM_CURRENT};
