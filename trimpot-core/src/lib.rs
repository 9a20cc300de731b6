//! Board-agnostic core logic for the Trimpot parameter console
//!
//! This crate contains everything between the serial line and the
//! controller memory that does not depend on specific hardware:
//!
//! - Parameter descriptors and unit conversion
//! - Registry lookup and bounded get/set
//! - Persistent store synchronization with a sentinel cell
//! - Watch list for periodic reports
//! - Line console dispatching to command handlers
//! - The hoverboard board table

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod board;
pub mod console;
pub mod param;
pub mod persist;
pub mod registry;
pub mod watch;

pub use console::{Console, ConsoleError, COMMANDS};
pub use registry::{ParamError, Registry, RegistryError, MAX_PARAMS};
pub use watch::{Toggle, WatchList, MAX_WATCHED};
