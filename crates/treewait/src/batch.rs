//! Waiting for several named children at once.
use std::{future::Future, pin::Pin, time::Duration};

use crate::{
    Waiter,
    error::WaitError,
    future::try_join_all,
    instance::Instance,
    signal::Connection,
    sync::Shared,
    time::Clock,
};

type ChildWait<'a, I> = Pin<Box<dyn Future<Output = Result<I, WaitError>> + 'a>>;

/// Watches children that were already found, for as long as the batch is
/// still undecided.
struct FoundWatch {
    tx: async_channel::Sender<()>,
    rx: async_channel::Receiver<()>,
    connections: Shared<Vec<Connection>>,
}

impl FoundWatch {
    fn new() -> Self {
        let (tx, rx) = async_channel::bounded(1);
        FoundWatch {
            tx,
            rx,
            connections: Default::default(),
        }
    }

    fn watch<I: Instance>(&self, child: &I) {
        let tx = self.tx.clone();
        let name = child.name();
        let connection = child.destroying().connect(move |_| {
            log::debug!("found child {name:?} destroyed before the batch completed");
            let _ = tx.try_send(());
        });
        self.connections.get_mut().push(connection);
    }

    async fn destroyed(&self) -> WaitError {
        let _ = self.rx.recv().await;
        WaitError::ContainerDestroyed
    }
}

impl<C: Clock> Waiter<C> {
    /// Wait for a child named after each of `names`.
    ///
    /// The children are awaited concurrently under one shared timeout. The
    /// result lists them in `names` order. If any child that was already
    /// found is destroyed before the whole batch is found, the batch fails
    /// with [`WaitError::ContainerDestroyed`], and it is checked once more
    /// after the last child arrives.
    pub async fn children<I: Instance>(
        &self,
        parent: &I,
        names: &[impl AsRef<str>],
        recursive: bool,
        timeout: Option<Duration>,
    ) -> Result<Vec<I>, WaitError> {
        let timeout = Some(self.timeout(timeout));
        let watch = FoundWatch::new();
        let found_watch = &watch;
        let waits: Vec<ChildWait<'_, I>> = names
            .iter()
            .map(move |name| {
                let watch = found_watch;
                let wait: ChildWait<'_, I> = Box::pin(async move {
                    let child = self.child(parent, name.as_ref(), recursive, timeout).await?;
                    watch.watch(&child);
                    Ok(child)
                });
                wait
            })
            .collect();

        let all_found = async {
            let found = try_join_all(waits).await?;
            if found.iter().any(|child| child.is_destroyed()) {
                log::debug!("a found child was destroyed before the batch completed");
                return Err(WaitError::ContainerDestroyed);
            }
            Ok::<_, WaitError>(found)
        };
        futures_lite::future::or(all_found, async { Err(watch.destroyed().await) }).await
    }
}
