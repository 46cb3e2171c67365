//! Future combinators not covered by [`futures_lite`].
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

/// Future for [`try_join_all`].
pub struct TryJoinAll<Fut, T> {
    pending: Vec<(usize, Fut)>,
    items: Vec<Option<T>>,
}

impl<Fut: Unpin, T> Unpin for TryJoinAll<Fut, T> {}

/// Run all `futures` concurrently.
///
/// Resolves with every output in input order once all succeed, or with the
/// first error as soon as one fails. On failure the remaining futures are
/// dropped right away.
pub fn try_join_all<Fut, T, E>(futures: impl IntoIterator<Item = Fut>) -> TryJoinAll<Fut, T>
where
    Fut: Future<Output = Result<T, E>> + Unpin,
{
    let pending: Vec<(usize, Fut)> = futures.into_iter().enumerate().collect();
    let items: Vec<Option<T>> = pending.iter().map(|_| None).collect();
    TryJoinAll { pending, items }
}

impl<Fut, T, E> Future for TryJoinAll<Fut, T>
where
    Fut: Future<Output = Result<T, E>> + Unpin,
{
    type Output = Result<Vec<T>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let join = self.get_mut();
        let mut failure = None;
        let items = &mut join.items;
        join.pending.retain_mut(|(index, fut)| {
            if failure.is_some() {
                return true;
            }
            match Pin::new(fut).poll(cx) {
                Poll::Ready(Ok(item)) => {
                    items[*index] = Some(item);
                    false
                }
                Poll::Ready(Err(e)) => {
                    failure = Some(e);
                    false
                }
                Poll::Pending => true,
            }
        });

        if let Some(e) = failure {
            join.pending.clear();
            return Poll::Ready(Err(e));
        }
        if join.pending.is_empty() {
            let items = std::mem::take(&mut join.items);
            Poll::Ready(Ok(items.into_iter().flatten().collect()))
        } else {
            Poll::Pending
        }
    }
}
