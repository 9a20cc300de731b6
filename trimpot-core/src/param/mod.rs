//! Parameter model
//!
//! - [`value`]: typed references into controller memory
//! - [`convert`]: external/internal unit conversion
//! - [`descriptor`]: the per-parameter declaration

pub mod convert;
pub mod descriptor;
pub mod value;

pub use convert::Scaling;
pub use descriptor::{ParamDescriptor, ParamKind, WriteHook};
pub use value::{Backing, DataType, ValueRef};
