//! Consume-and-deliver role.
//!
//! Polls the broker for raw-item batches, normalizes each item, and
//! delivers it to the persistence API. Failures are isolated per item and
//! reported through the logging sink; the loop itself never crashes on a
//! broker-level or delivery-level error.

pub mod config;
pub mod delivery;
pub mod service;

pub use config::StreamConfig;
pub use delivery::{Deliver, Delivery, DeliveryClient};
pub use service::{dispatch_batch, StreamService, StreamServiceConfig};
