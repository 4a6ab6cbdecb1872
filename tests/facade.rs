//! Extension facade over sinks

use anyhow::Context;
use easy_logger::facade::{frames_for, LevelLogger, LoggerExt, Severity, SinkLogger};
use easy_logger::sinks::MemorySink;
use easy_logger::{LogLevel, StackConfig};
use std::sync::Arc;

fn logger(bottom: Severity) -> (Arc<MemorySink>, SinkLogger) {
    let memory = Arc::new(MemorySink::new());
    (memory.clone(), SinkLogger::shared(memory, bottom))
}

#[test]
fn bottom_level_gates_messages() {
    let (memory, logger) = logger(Severity::Warn);
    logger
        .verbose("v", &[])
        .debug("d", &[])
        .info("i", &[])
        .warn("w {0}", &[&1])
        .error("e {0}", &[&2]);

    assert_eq!(
        memory.entries(),
        vec![
            (LogLevel::Warn, "w 1".to_string()),
            (LogLevel::Error, "e 2".to_string())
        ]
    );
}

#[test]
fn none_bottom_level_silences_everything() {
    let (memory, logger) = logger(Severity::None);
    logger.error("dropped", &[]);
    assert!(!logger.can_log(Severity::None));
    assert!(memory.is_empty());
}

#[test]
fn malformed_template_is_logged_as_diagnostic() {
    let (memory, logger) = logger(Severity::Verbose);
    logger.info("{0} and {1}", &[&"a"]);
    assert_eq!(
        memory.messages(),
        vec!["MalFormatted: format='{0} and {1}', args=[[0]a]"]
    );
}

#[test]
fn error_message_names_context_and_root_cause() {
    let (memory, logger) = logger(Severity::Verbose);
    let error = std::fs::read_to_string("/definitely/not/here.toml")
        .context("loading settings")
        .unwrap_err();

    logger.warn_error(&error);

    let message = &memory.messages_at(LogLevel::Warn)[0];
    let mut lines = message.lines();
    assert_eq!(lines.next(), Some("loading settings"));
    assert!(lines.next().unwrap().starts_with("Caused by: "));
    let frame_lines = lines.filter(|l| !l.trim().is_empty()).count();
    assert!(frame_lines <= frames_for(Severity::Warn), "{}", message);
}

#[inline(never)]
fn fail_in_app_code(logger: &SinkLogger) {
    logger.error_error(&anyhow::anyhow!("boom"));
}

#[test]
fn error_stack_starts_at_the_caller() {
    let (memory, logger) = logger(Severity::Verbose);
    fail_in_app_code(&logger);

    let message = &memory.messages()[0];
    let lines: Vec<&str> = message.lines().collect();
    assert_eq!(lines[0], "boom");
    assert!(lines[1].contains("facade::fail_in_app_code"), "{}", message);
    assert!(!message.contains("easy_logger::"), "{}", message);
}

#[test]
fn custom_stack_config_changes_filters() {
    let config = StackConfig {
        filters: vec![".*".to_string()],
        indent: '-',
        ..StackConfig::default()
    };
    let (memory, logger) = logger(Severity::Verbose);
    let logger = logger.with_stack_config(&config).unwrap();

    logger.error_error(&anyhow::anyhow!("plain failure"));

    assert_eq!(memory.messages(), vec!["plain failure\n"]);
    assert_eq!(logger.stack_indent(), '-');
}
