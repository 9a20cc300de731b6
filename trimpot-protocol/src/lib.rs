//! Serial Console Protocol
//!
//! This crate defines the text protocol spoken between an operator
//! terminal and the controller. Requests are single ASCII lines:
//!
//! ```text
//! VERB [ NAME [ SPACE SIGNED-INT ] ] TERMINATOR
//! ```
//!
//! Every reply line is terminated by `\r\n` and its first character
//! tells the category:
//!
//! ```text
//! # name:I_MOT_MAX value:15 init:15 min:1 max:40   definition
//! ? I_MOT_MAX:Max phase current A [min:1 max:40]   help
//! ! Parameter not found                            diagnostic
//! OK                                               acknowledgment
//! SPD_AVG:0 BATV:3650                              watch report
//! ```
//!
//! The controller side only assembles lines and encodes replies here;
//! resolving verbs and names is the job of `trimpot-core`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod line;
pub mod reply;

pub use line::{Line, LineError, LineParser, MAX_LINE_LEN};
pub use reply::{write_watch_line, Diagnostic, Reply, WatchEntry, EOL};
