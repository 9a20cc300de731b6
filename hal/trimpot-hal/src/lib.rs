//! Trimpot Hardware Abstraction Layer
//!
//! This crate defines the persistent storage abstraction the parameter
//! registry is written against. Chip-specific firmware implements it on
//! top of its flash (sector emulation, wear leveling); host builds and
//! tests use the RAM-backed [`ram::RamEeprom`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  trimpot-core (registry, console)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  trimpot-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ flash shadow  │       │   RamEeprom   │
//! │  (firmware)   │       │    (host)     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`eeprom::EepromStorage`] - Emulated EEPROM of 16-bit cells

#![no_std]
#![deny(unsafe_code)]

pub mod eeprom;
pub mod ram;

// Re-export key types at crate root for convenience
pub use eeprom::{EepromError, EepromStorage, Unlocked, VirtAddr};
pub use ram::RamEeprom;
