//! Vendor-specific implementations.

pub mod juniper;
