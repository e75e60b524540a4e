//! Outbound notification shapes shared by orchestrators and transports.

pub mod events;

pub use events::OutboundEvent;
