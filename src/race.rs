// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deadline races.
//!
//! Running out of time is a normal outcome here: the helpers report it as
//! `None` rather than as an error. The losing side is always dropped, which
//! cancels it and releases whatever it holds (channel attachments,
//! subscriber guards).

use std::future::Future;
use std::time::Duration;

use futures::{Stream, StreamExt};

/// Runs `operation` until it completes or `deadline` elapses.
///
/// Returns `Some(output)` if the operation finished first. Otherwise the
/// operation is dropped and `None` is returned. Exactly one of the two
/// happens; once a value is returned the timer is gone.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use locmux::race::first_or_none;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fast = first_or_none(async { 7 }, Duration::from_secs(1)).await;
/// assert_eq!(fast, Some(7));
///
/// let never = first_or_none(std::future::pending::<u8>(), Duration::from_millis(5)).await;
/// assert_eq!(never, None);
/// # }
/// ```
pub async fn first_or_none<F>(operation: F, deadline: Duration) -> Option<F::Output>
where
    F: Future,
{
    if let Ok(output) = tokio::time::timeout(deadline, operation).await {
        Some(output)
    } else {
        tracing::debug!(?deadline, "Deadline elapsed before a value arrived");
        None
    }
}

/// Waits for the first item of `stream`, giving up after `deadline`.
///
/// Returns `None` both on deadline and when the stream ends without
/// yielding.
pub async fn first_item_or_none<S>(stream: &mut S, deadline: Duration) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    first_or_none(stream.next(), deadline).await.flatten()
}

enum Step<T> {
    Item(Option<T>),
    Deadline,
}

/// Passes `stream` through, inserting a single `Ok(None)` if nothing has
/// arrived by `deadline`.
///
/// Items keep flowing after the marker. Once any item has been seen the
/// timer is dropped and no marker is produced.
pub fn mark_absence<S, T, E>(stream: S, deadline: Duration) -> impl Stream<Item = Result<Option<T>, E>>
where
    S: Stream<Item = Result<T, E>>,
{
    async_stream::stream! {
        let mut stream = Box::pin(stream);
        let timer = tokio::time::sleep(deadline);
        tokio::pin!(timer);
        let mut waiting = true;

        loop {
            let step = if waiting {
                tokio::select! {
                    item = stream.next() => Step::Item(item),
                    () = &mut timer => Step::Deadline,
                }
            } else {
                Step::Item(stream.next().await)
            };

            match step {
                Step::Deadline => {
                    waiting = false;
                    yield Ok(None);
                }
                Step::Item(Some(item)) => {
                    waiting = false;
                    yield item.map(Some);
                }
                Step::Item(None) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use futures::stream;

    use super::*;

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn value_before_deadline_wins() {
        let operation = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            "sample"
        };

        assert_eq!(
            first_or_none(operation, Duration::from_secs(1)).await,
            Some("sample")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_drops_the_operation() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(Arc::clone(&dropped));
        let operation = async move {
            let _flag = flag;
            std::future::pending::<()>().await;
        };

        assert_eq!(first_or_none(operation, Duration::from_secs(1)).await, None);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn first_item_of_stream() {
        let mut items = stream::iter(vec![1, 2, 3]);
        assert_eq!(
            first_item_or_none(&mut items, Duration::from_secs(1)).await,
            Some(1)
        );

        let mut empty = stream::empty::<u8>();
        assert_eq!(
            first_item_or_none(&mut empty, Duration::from_secs(1)).await,
            None
        );

        let mut silent = stream::pending::<u8>();
        assert_eq!(
            first_item_or_none(&mut silent, Duration::from_secs(1)).await,
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn absence_marker_then_items() {
        let delayed = stream::once(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ()>(42)
        });

        let items: Vec<_> = mark_absence(delayed, Duration::from_secs(1)).collect().await;

        assert_eq!(items, vec![Ok(None), Ok(Some(42))]);
    }

    #[tokio::test(start_paused = true)]
    async fn no_marker_when_item_arrives_in_time() {
        let quick = stream::iter(vec![Ok::<_, ()>(1), Ok(2)]);

        let items: Vec<_> = mark_absence(quick, Duration::from_secs(1)).collect().await;

        assert_eq!(items, vec![Ok(Some(1)), Ok(Some(2))]);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_pass_through() {
        let failing = stream::iter(vec![Err::<u8, _>("boom")]);

        let items: Vec<_> = mark_absence(failing, Duration::from_secs(1)).collect().await;

        assert_eq!(items, vec![Err("boom")]);
    }
}
