//! Free-running sprite clock.
//!
//! A small thread sleeps for the frame interval and posts a tick; the thread
//! exits once the subscription (and with it the receiver) is dropped.

use iced::advanced::subscription::{EventStream, Hasher, Recipe};
use iced::futures::{self, StreamExt};
use std::hash::{Hash, Hasher as _};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteTicker {
    interval: Duration,
}

impl SpriteTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Recipe for SpriteTicker {
    type Output = ();

    fn hash(&self, state: &mut Hasher) {
        std::any::TypeId::of::<Self>().hash(state);
        state.write_u128(self.interval.as_nanos());
    }

    fn stream(
        self: Box<Self>,
        _input: EventStream,
    ) -> futures::stream::BoxStream<'static, Self::Output> {
        let (tx, rx) = async_channel::bounded(1);
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name("ribbonmeter-sprite-ticker".into())
            .spawn(move || {
                loop {
                    thread::sleep(interval);
                    // A full slot means the UI has not consumed the last tick yet.
                    match tx.try_send(()) {
                        Ok(()) | Err(async_channel::TrySendError::Full(())) => {}
                        Err(async_channel::TrySendError::Closed(())) => break,
                    }
                }
                debug!("[ticker] stopped");
            });
        if let Err(err) = spawned {
            warn!("[ticker] failed to spawn sprite ticker: {err}");
        }

        futures::stream::unfold(rx, |rx| async move {
            rx.recv().await.ok().map(|()| ((), rx))
        })
        .boxed()
    }
}
