//! Stack frame capture and filtering
//!
//! Frames are captured from the current call stack, or from the backtrace an
//! [`anyhow::Error`] carries, and screened against exclusion patterns so only
//! frames useful for trouble-shooting remain. Captures start at the caller:
//! frames of this crate and of the capture machinery are dropped first, and
//! filtered frames keep the index they had after that.

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

/// Default number of frames to keep
pub const DEFAULT_FRAME_COUNT: usize = 5;

/// Patterns screening runtime and framework frames, matched against the symbol
pub const DEFAULT_STACK_FILTERS: [&str; 8] = [
    r"^std::",
    r"^core::",
    r"^alloc::",
    r"^anyhow::",
    r"^test::",
    r"^__rust",
    r"^rust_begin_unwind",
    r"^<?easy_logger::core::stack",
];

static DEFAULT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_STACK_FILTERS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

static FRAME_HEADER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\s*(\d+):\s+(.+)$").ok());
static FRAME_LOCATION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\s*at\s+(.+?):(\d+)(?::\d+)?\s*$").ok());

/// One frame of a captured stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// Position in the capture, newest frame first
    pub index: usize,
    /// Demangled symbol, e.g. `my_app::worker::run`
    pub symbol: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl FrameDescriptor {
    pub fn new<S: Into<String>>(index: usize, symbol: S) -> Self {
        Self {
            index,
            symbol: symbol.into(),
            file: None,
            line: None,
        }
    }

    pub fn with_location<S: Into<String>>(mut self, file: S, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// True when the frame points at a line of source outside the toolchain
    pub fn has_source_line(&self) -> bool {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => line > 0 && !file.starts_with("/rustc/"),
            _ => false,
        }
    }

    /// Textual description: symbol plus location when known
    pub fn description(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{} at {}:{}", self.symbol, file, line),
            _ => self.symbol.clone(),
        }
    }
}

impl fmt::Display for FrameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Capability returning the unfiltered frames of the current stack or of an
/// error, newest first
pub trait FrameSource: Send + Sync {
    fn frames(&self, error: Option<&anyhow::Error>) -> Vec<FrameDescriptor>;
}

/// [`FrameSource`] built on `std::backtrace`
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceSource;

impl FrameSource for BacktraceSource {
    fn frames(&self, error: Option<&anyhow::Error>) -> Vec<FrameDescriptor> {
        if let Some(error) = error {
            let backtrace = error.backtrace();
            if backtrace.status() == BacktraceStatus::Captured {
                return frames_after(parse_backtrace(&backtrace.to_string()), is_backtrace_frame);
            }
        }
        frames_after(
            parse_backtrace(&Backtrace::force_capture().to_string()),
            is_facade_frame,
        )
    }
}

fn symbol_path(frame: &FrameDescriptor) -> &str {
    frame.symbol.trim_start_matches('<')
}

/// Frames from this crate's own non-test code
pub fn is_facade_frame(frame: &FrameDescriptor) -> bool {
    symbol_path(frame)
        .strip_prefix(env!("CARGO_CRATE_NAME"))
        .is_some_and(|rest| rest.starts_with("::") && !rest.contains("::tests::"))
}

/// Frames recording an error's backtrace
fn is_backtrace_frame(frame: &FrameDescriptor) -> bool {
    let symbol = symbol_path(frame);
    symbol.starts_with("anyhow::") || symbol.starts_with("std::backtrace")
}

/// Drop every frame up to and including the oldest one matching `internal`,
/// renumbering the rest from 0. Without a match the frames are returned
/// unchanged.
pub fn frames_after<F>(mut frames: Vec<FrameDescriptor>, internal: F) -> Vec<FrameDescriptor>
where
    F: Fn(&FrameDescriptor) -> bool,
{
    if let Some(oldest) = frames.iter().rposition(|frame| internal(frame)) {
        frames.drain(..=oldest);
        for (index, frame) in frames.iter_mut().enumerate() {
            frame.index = index;
        }
    }
    frames
}

/// Parse the text rendering of a `std::backtrace::Backtrace`.
pub fn parse_backtrace(text: &str) -> Vec<FrameDescriptor> {
    let (Some(header), Some(location)) = (FRAME_HEADER.as_ref(), FRAME_LOCATION.as_ref()) else {
        return Vec::new();
    };
    let mut frames: Vec<FrameDescriptor> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = header.captures(line) {
            frames.push(FrameDescriptor::new(frames.len(), caps[2].trim()));
        } else if let Some(caps) = location.captures(line) {
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_none() {
                    frame.file = Some(caps[1].to_string());
                    frame.line = caps[2].parse().ok();
                }
            }
        }
    }
    frames
}

/// Compile exclusion patterns
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p.as_ref()).map_err(Into::into))
        .collect()
}

/// The compiled [`DEFAULT_STACK_FILTERS`]
pub fn default_patterns() -> &'static [Regex] {
    &DEFAULT_PATTERNS
}

/// Drop frames matching any pattern and keep at most `max_count` of the rest,
/// in their original order and with their original indexes.
pub fn filter_frames(
    frames: Vec<FrameDescriptor>,
    max_count: usize,
    patterns: &[Regex],
) -> Vec<FrameDescriptor> {
    frames
        .into_iter()
        .filter(|frame| !patterns.iter().any(|p| p.is_match(&frame.symbol)))
        .take(max_count)
        .collect()
}

/// One line per frame: `indent` repeated `2 * position`, then
/// `[{original index}]: {description}`.
pub fn render(frames: &[FrameDescriptor], indent: char) -> String {
    let mut out = String::new();
    for (position, frame) in frames.iter().enumerate() {
        out.extend(std::iter::repeat(indent).take(position * 2));
        out.push_str(&format!("[{}]: {}\n", frame.index, frame.description()));
    }
    out
}

/// Captures and filters stack frames
pub struct StackFilter {
    patterns: Vec<Regex>,
    source: Box<dyn FrameSource>,
}

impl fmt::Debug for StackFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackFilter")
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl Default for StackFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl StackFilter {
    /// Filter using [`DEFAULT_STACK_FILTERS`] over `std::backtrace` frames
    pub fn new() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.clone(),
            source: Box::new(BacktraceSource),
        }
    }

    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Ok(Self {
            patterns: compile_patterns(patterns)?,
            source: Box::new(BacktraceSource),
        })
    }

    pub fn with_source<F: FrameSource + 'static>(mut self, source: F) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// Unfiltered frames of the current stack or of `error`
    pub fn raw_frames(&self, error: Option<&anyhow::Error>) -> Vec<FrameDescriptor> {
        self.source.frames(error)
    }

    /// Up to `max_count` meaningful frames. `max_count == 0` returns nothing
    /// without touching the stack.
    pub fn capture(&self, max_count: usize, error: Option<&anyhow::Error>) -> Vec<FrameDescriptor> {
        if max_count == 0 {
            return Vec::new();
        }
        filter_frames(self.source.frames(error), max_count, &self.patterns)
    }

    /// [`capture`](Self::capture) keeping [`DEFAULT_FRAME_COUNT`] frames
    pub fn capture_default(&self, error: Option<&anyhow::Error>) -> Vec<FrameDescriptor> {
        self.capture(DEFAULT_FRAME_COUNT, error)
    }

    /// [`capture`](Self::capture) rendered with [`render`]
    pub fn capture_string(
        &self,
        max_count: usize,
        error: Option<&anyhow::Error>,
        indent: char,
    ) -> String {
        render(&self.capture(max_count, error), indent)
    }
}

/// Capture with the default frame source, overriding the patterns if given.
pub fn capture(
    max_count: usize,
    error: Option<&anyhow::Error>,
    patterns: Option<&[Regex]>,
) -> Vec<FrameDescriptor> {
    if max_count == 0 {
        return Vec::new();
    }
    let patterns = patterns.unwrap_or_else(|| default_patterns());
    filter_frames(BacktraceSource.frames(error), max_count, patterns)
}
