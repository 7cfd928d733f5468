//! Line-oriented event feed.
//!
//! Stands in for the host editor's delegate wiring: whatever glue observes
//! asset adds/removes/renames and object saves writes one line per event to
//! this process, and the feed maps each line to an aggregator record call.
//!
//! Line format: `<kind>` or `save <entity name>`, where kind is one of
//! `add`, `remove`, `rename`, `save`. Blank lines and `#` comments are
//! ignored; malformed lines are logged and skipped, never fatal.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::activity::{ActivityAggregator, EventKind};
use crate::error::{Result, WakabeatError};

/// A parsed feed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    pub kind: EventKind,
    pub entity: Option<String>,
}

/// Parse one feed line into an event.
pub fn parse_line(line: &str) -> Result<Option<FeedEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (kind_str, rest) = match line.split_once(char::is_whitespace) {
        Some((kind, rest)) => (kind, rest.trim()),
        None => (line, ""),
    };

    let kind: EventKind = kind_str.parse()?;
    let entity = match kind {
        EventKind::Save if !rest.is_empty() => Some(rest.to_string()),
        EventKind::Save => None,
        _ if !rest.is_empty() => {
            return Err(WakabeatError::Feed(format!(
                "unexpected trailing input after '{}'",
                kind_str
            )))
        }
        _ => None,
    };

    Ok(Some(FeedEvent { kind, entity }))
}

/// Consume the reader until EOF, recording each well-formed event with the
/// current wall-clock time.
pub async fn run<R>(reader: R, aggregator: Arc<ActivityAggregator>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(event)) => {
                debug!("Feed event: {:?}", event.kind);
                aggregator.record(
                    event.kind,
                    chrono::Utc::now().timestamp(),
                    event.entity.as_deref(),
                );
            }
            Ok(None) => {}
            Err(e) => warn!("Skipping malformed feed line {:?}: {}", line, e),
        }
    }
    debug!("Event feed closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_kinds() {
        assert_eq!(
            parse_line("add").unwrap().unwrap(),
            FeedEvent {
                kind: EventKind::Add,
                entity: None
            }
        );
        assert_eq!(
            parse_line("remove").unwrap().unwrap().kind,
            EventKind::Remove
        );
        assert_eq!(
            parse_line("rename").unwrap().unwrap().kind,
            EventKind::Rename
        );
    }

    #[test]
    fn test_parse_save_with_entity() {
        let event = parse_line("save /Game/Maps/Arena.umap").unwrap().unwrap();
        assert_eq!(event.kind, EventKind::Save);
        assert_eq!(event.entity.as_deref(), Some("/Game/Maps/Arena.umap"));
    }

    #[test]
    fn test_parse_save_entity_may_contain_spaces() {
        let event = parse_line("save My Cool Blueprint").unwrap().unwrap();
        assert_eq!(event.entity.as_deref(), Some("My Cool Blueprint"));
    }

    #[test]
    fn test_parse_save_without_entity() {
        let event = parse_line("save").unwrap().unwrap();
        assert_eq!(event.kind, EventKind::Save);
        assert_eq!(event.entity, None);
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# a comment").unwrap(), None);
    }

    #[test]
    fn test_unknown_kind_is_error() {
        assert!(parse_line("compile").is_err());
    }

    #[test]
    fn test_trailing_input_on_non_save_is_error() {
        assert!(parse_line("add Foo").is_err());
    }

    #[tokio::test]
    async fn test_run_records_events_and_skips_garbage() {
        let input = b"add\nsave Foo\nnonsense line\nremove\n" as &[u8];
        let aggregator = Arc::new(ActivityAggregator::new());
        run(input, Arc::clone(&aggregator)).await.unwrap();

        // All lines share one wall-clock second, so the debounce collapses
        // the burst to the first event.
        let snap = aggregator.take_snapshot().unwrap();
        assert_eq!(
            snap.add_count + snap.delete_count + snap.save_count,
            1,
            "burst collapses to one accepted event"
        );
        assert_eq!(snap.add_count, 1);
    }
}
