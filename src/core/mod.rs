//! Portable core: wire names, transport codec and the correlation registry.
//!
//! Nothing here touches the DOM; it compiles and is tested natively.

pub mod codec;
pub mod names;
pub mod registry;
