//! The process-wide context behind the crate-root functions

use easy_logger::sinks::MemorySink;
use easy_logger::{LevelMask, LogLevel, LoggerBuilder};
use std::sync::Arc;

#[test]
fn free_functions_share_one_context() {
    assert!(std::ptr::eq(easy_logger::global(), easy_logger::global()));

    let primary = easy_logger::global().primary().unwrap();
    assert_eq!(primary.description(), "console");

    let memory = Arc::new(MemorySink::new());
    let handle = easy_logger::attach(
        LoggerBuilder::shared(LevelMask::INFO_AND_ABOVE, memory.clone())
            .tag(|level| format!("<{}>", level.initial())),
    );

    easy_logger::d("below info");
    easy_logger::i("hello");
    easy_logger::w_fmt("{0}%", &[&99]);
    easy_logger::e_error(
        &std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        None,
    );
    drop(handle);
    easy_logger::e("not recorded");

    assert_eq!(
        memory.entries(),
        vec![
            (LogLevel::Info, "<I>: hello".to_string()),
            (LogLevel::Warn, "<W>: 99%".to_string()),
            (LogLevel::Error, "<E>: boom".to_string()),
        ]
    );

    easy_logger::mark_moment(Some("global"));
    easy_logger::mark_moment(Some("global"));
    assert_eq!(easy_logger::get_moments("global", None).unwrap().len(), 2);
    assert_eq!(easy_logger::get_intervals("global", None).unwrap().len(), 1);
    assert!(easy_logger::moment_keys().contains("global"));

    let previous = easy_logger::change_default_level(LevelMask::ERROR);
    assert_eq!(primary.mask(), LevelMask::ERROR);
    easy_logger::change_default_level(previous);
    assert!(!easy_logger::elapsed_time_string().is_empty());
}
