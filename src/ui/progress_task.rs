// SPDX-License-Identifier: MPL-2.0
//! Long-running backend work that reports progress to the UI.
//!
//! The work future runs on its own tokio task, spawned on first poll.
//! Progress values travel over a bounded channel and the final result over
//! a oneshot; the returned stream yields one message per progress value,
//! then exactly one completion message. The stream owns the spawned task:
//! dropping the stream aborts the work.

use crate::error::Error;
use iced::futures::channel::{mpsc, oneshot};
use iced::futures::stream::{self, Stream};
use iced::futures::StreamExt;
use iced::Task;
use std::future::Future;
use tokio::task::JoinHandle;

const PROGRESS_BUFFER: usize = 100;

/// Handed to the work closure. Reports are dropped when the UI lags.
#[derive(Debug)]
pub struct ProgressSender<P> {
    tx: mpsc::Sender<P>,
}

impl<P> ProgressSender<P> {
    pub fn report(&mut self, value: P) {
        let _ = self.tx.try_send(value);
    }
}

/// Aborts the spawned work when dropped.
struct WorkerGuard(JoinHandle<()>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum Phase<P, T, Fut> {
    Idle {
        work: Fut,
        result_tx: oneshot::Sender<Result<T, Error>>,
        progress_rx: mpsc::Receiver<P>,
        result_rx: oneshot::Receiver<Result<T, Error>>,
    },
    ReceivingProgress {
        progress_rx: mpsc::Receiver<P>,
        result_rx: oneshot::Receiver<Result<T, Error>>,
        worker: WorkerGuard,
    },
    Completed,
}

/// Turns `work` into a stream of progress messages and one completion.
///
/// Nothing is spawned until the stream is first polled.
pub fn progress_stream<P, T, M, F, Fut>(
    work: F,
    on_progress: fn(P) -> M,
    on_done: fn(Result<T, Error>) -> M,
) -> impl Stream<Item = M> + Send + 'static
where
    P: Send + 'static,
    T: Send + 'static,
    M: Send + 'static,
    F: FnOnce(ProgressSender<P>) -> Fut,
    Fut: Future<Output = Result<T, Error>> + Send + 'static,
{
    let (progress_tx, progress_rx) = mpsc::channel::<P>(PROGRESS_BUFFER);
    let (result_tx, result_rx) = oneshot::channel::<Result<T, Error>>();

    let work = work(ProgressSender { tx: progress_tx });

    stream::unfold(
        Phase::Idle {
            work,
            result_tx,
            progress_rx,
            result_rx,
        },
        move |mut phase| async move {
            loop {
                match phase {
                    Phase::Idle {
                        work,
                        result_tx,
                        progress_rx,
                        result_rx,
                    } => {
                        let handle = tokio::spawn(async move {
                            let result = work.await;
                            let _ = result_tx.send(result);
                            // The progress sender was owned by the future and
                            // is gone now, which closes the progress channel.
                        });
                        phase = Phase::ReceivingProgress {
                            progress_rx,
                            result_rx,
                            worker: WorkerGuard(handle),
                        };
                    }
                    Phase::ReceivingProgress {
                        mut progress_rx,
                        result_rx,
                        worker,
                    } => {
                        return match progress_rx.next().await {
                            Some(value) => Some((
                                on_progress(value),
                                Phase::ReceivingProgress {
                                    progress_rx,
                                    result_rx,
                                    worker,
                                },
                            )),
                            None => {
                                let result = result_rx.await;
                                Some((on_done(flatten(result)), Phase::Completed))
                            }
                        };
                    }
                    Phase::Completed => return None,
                }
            }
        },
    )
}

/// [`progress_stream`] as an Iced task.
pub fn run_with_progress<P, T, M, F, Fut>(
    work: F,
    on_progress: fn(P) -> M,
    on_done: fn(Result<T, Error>) -> M,
) -> Task<M>
where
    P: Send + 'static,
    T: Send + 'static,
    M: Send + 'static,
    F: FnOnce(ProgressSender<P>) -> Fut,
    Fut: Future<Output = Result<T, Error>> + Send + 'static,
{
    Task::stream(progress_stream(work, on_progress, on_done))
}

fn flatten<T>(received: Result<Result<T, Error>, oneshot::Canceled>) -> Result<T, Error> {
    received.unwrap_or_else(|_| Err(Error::Io("background task cancelled".to_string())))
}
