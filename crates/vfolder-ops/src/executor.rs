//! Async entry point that streams write progress over a channel.

use std::path::PathBuf;

use tokio::sync::mpsc;

use vfolder_core::VirtualFolder;

use crate::OPERATION_CHANNEL_SIZE;
use crate::operation::WriteOptions;
use crate::progress::{WriteProgress, WriteResult};
use crate::writer::HierarchyWriter;

/// Events sent while a tree is being written.
#[derive(Debug)]
pub enum WriteEvent {
    /// Progress update after an item was processed.
    Progress(WriteProgress),
    /// The write finished; always the last event.
    Complete(WriteResult),
}

/// Start writing `folder` to `dest` on a blocking task.
///
/// The tree is moved into the task; clone it first to keep a copy. Progress
/// updates are dropped when the receiver falls behind, the final
/// [`WriteEvent::Complete`] is not. Must be called from within a tokio
/// runtime.
pub fn start_write(
    dest: PathBuf,
    folder: VirtualFolder,
    options: WriteOptions,
) -> mpsc::Receiver<WriteEvent> {
    let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);

    tokio::task::spawn_blocking(move || {
        let writer = HierarchyWriter::new(options).with_progress(tx.clone());
        let result = writer.write(&dest, &folder);
        if tx.blocking_send(WriteEvent::Complete(result)).is_err() {
            tracing::debug!(dest = %dest.display(), "write receiver dropped before completion");
        }
    });

    rx
}

/// Drain a write channel and return the final result, if one arrived.
pub async fn wait_for_completion(mut rx: mpsc::Receiver<WriteEvent>) -> Option<WriteResult> {
    while let Some(event) = rx.recv().await {
        if let WriteEvent::Complete(result) = event {
            return Some(result);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::WriteAction;
    use tempfile::TempDir;
    use vfolder_core::VirtualItem;

    fn tree(items: usize) -> VirtualFolder {
        let mut root = VirtualFolder::new("root").unwrap();
        for i in 0..items {
            root.add_item(VirtualItem::new(format!("f{i}"), "txt", Some(vec![b'x'; i])).unwrap())
                .unwrap();
        }
        root
    }

    #[tokio::test]
    async fn test_start_write_streams_progress() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let options = WriteOptions::new(WriteAction::Write).execute(true);
        let mut rx = start_write(dest.clone(), tree(5), options);

        let mut progress_events = 0;
        let mut complete = None;
        while let Some(event) = rx.recv().await {
            match event {
                WriteEvent::Progress(p) => {
                    assert_eq!(p.items_total, 5);
                    progress_events += 1;
                }
                WriteEvent::Complete(result) => complete = Some(result),
            }
        }

        let result = complete.unwrap();
        assert_eq!(progress_events, 5);
        assert_eq!(result.succeeded, 5);
        assert_eq!(result.bytes_processed, 10);
        assert!(dest.join("f4.txt").is_file());
    }

    #[tokio::test]
    async fn test_start_write_dry_run() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let rx = start_write(dest.clone(), tree(3), WriteOptions::new(WriteAction::Write));

        let result = wait_for_completion(rx).await.unwrap();
        assert!(!result.executed);
        assert_eq!(result.succeeded, 3);
        assert!(!dest.exists());
    }
}
