//! EasyLogger core
//!
//! Level masks, the logger pipeline, the event bus, moment timing, stack
//! filtering and template substitution.

pub mod builders;
pub mod bus;
pub mod level;
pub mod logger;
pub mod moments;
pub mod stack;
pub mod stopwatch;
pub mod template;

pub use builders::{StacktraceStyle, TagStyle};
pub use bus::{EventBus, Listener};
pub use level::{LevelMask, LogLevel};
pub use logger::{ErrorReport, Fallback, Logger, LoggerBuilder, LoggerHandle};
pub use moments::{MomentRegistry, SystemTicks, TickSource};
pub use stack::{FrameDescriptor, FrameSource, StackFilter};
pub use stopwatch::{format_elapsed, Stopwatch, SystemStopwatch};
pub use template::{format_template, try_format};
