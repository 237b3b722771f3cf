//! Seller-side client for the market realtime gateway: listens for order
//! notifications and escalates the ones left unacknowledged.

pub mod config;
pub mod escalator;
pub mod notifier;
pub mod store;
