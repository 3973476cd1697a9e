use fetch_pool::{Error, TaskProducer, TaskQueue};
use std::{
    io::{BufRead, ErrorKind},
    sync::Arc,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

const LINE_BUFFER: usize = 64;

/// Submits every non-empty stdin line as a task.
///
/// Lines are read on a dedicated OS thread; a pending read never holds up
/// runtime shutdown. The returned task ends on EOF, on cancellation, or once
/// the pool refuses new work.
pub fn spawn_stdin_reader<Q: TaskQueue>(
    producer: Arc<TaskProducer<Q>>,
    cancel: CancellationToken,
) -> std::io::Result<JoinHandle<()>> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || read_lines(std::io::stdin().lock(), &tx))?;

    Ok(tokio::spawn(submit_lines(producer, rx, cancel)))
}

fn read_lines(reader: impl BufRead, tx: &mpsc::Sender<String>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            // The offending line is consumed, reading resumes after it.
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Skipping stdin line that is not valid UTF-8: {e}");
                continue;
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to read stdin: {_e}");
                break;
            }
        };
        let target = line.trim();
        if target.is_empty() {
            continue;
        }
        if tx.blocking_send(target.to_string()).is_err() {
            break;
        }
    }
}

async fn submit_lines<Q: TaskQueue>(
    producer: Arc<TaskProducer<Q>>,
    mut lines: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    loop {
        let target = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            line = lines.recv() => match line {
                Some(target) => target,
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("Reached end of stdin");
                    break;
                }
            },
        };

        match producer.process_url(target).await {
            Ok(_) => {}
            Err(Error::ServiceShutdown) => break,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to submit task from stdin: {_e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetch_pool::{Result, WorkItem};
    use std::io::Cursor;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(String, String)>>);

    impl TaskQueue for Collect {
        async fn add_task(&self, item: WorkItem) -> Result<()> {
            self.0
                .lock()
                .await
                .push((item.id().to_string(), item.target().to_string()));
            Ok(())
        }
    }

    #[test]
    fn skips_blank_lines_and_trims() {
        let (tx, mut rx) = mpsc::channel(8);
        read_lines(Cursor::new("https://a\n\n   \n  https://b  \n"), &tx);
        drop(tx);

        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        assert_eq!(lines, ["https://a", "https://b"]);
    }

    #[test]
    fn skips_lines_that_are_not_utf8() {
        let (tx, mut rx) = mpsc::channel(8);
        read_lines(
            Cursor::new(&b"https://a\n\xff\xfe\nhttps://b\nhttps://c\n"[..]),
            &tx,
        );
        drop(tx);

        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        assert_eq!(lines, ["https://a", "https://b", "https://c"]);
    }

    #[tokio::test]
    async fn submits_until_input_closes() {
        let queue = Arc::new(Collect::default());
        let producer = Arc::new(TaskProducer::new(Arc::clone(&queue)));
        let (tx, rx) = mpsc::channel(8);

        tx.send("https://a".to_string()).await.unwrap();
        tx.send("https://b".to_string()).await.unwrap();
        drop(tx);
        submit_lines(producer, rx, CancellationToken::new()).await;

        assert_eq!(
            *queue.0.lock().await,
            [
                ("task-1".to_string(), "https://a".to_string()),
                ("task-2".to_string(), "https://b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let queue = Arc::new(Collect::default());
        let producer = Arc::new(TaskProducer::new(Arc::clone(&queue)));
        let (_tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        submit_lines(producer, rx, cancel).await;
        assert!(queue.0.lock().await.is_empty());
    }
}
