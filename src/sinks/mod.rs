//! EasyLogger sinks
//!
//! Output targets for composed messages: console, file, memory and any
//! closure with the sink signature.

pub mod console;
pub mod file;
pub mod memory;
pub mod traits;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use memory::MemorySink;
pub use traits::{from_fn, Sink, SinkError, SinkResult};
