use async_channel::Receiver as AsyncReceiver;
use iced::advanced::subscription::{EventStream, Hasher, Recipe};
use iced::futures::{self, StreamExt};
use std::hash::Hasher as _;
use std::sync::Arc;
use tracing::{debug, warn};

/// Forwards magnitude frames from the signal thread to the UI, one item per frame.
///
/// Frames whose length differs from the transform size are dropped; the band
/// reduction assumes every frame splits the same way.
#[derive(Clone, Debug)]
pub struct MagnitudeSubscription {
    receiver: Arc<AsyncReceiver<Vec<f32>>>,
    frame_len: usize,
}

impl MagnitudeSubscription {
    pub fn new(receiver: Arc<AsyncReceiver<Vec<f32>>>, frame_len: usize) -> Self {
        Self {
            receiver,
            frame_len,
        }
    }

    fn accepts(&self, frame: &[f32]) -> bool {
        frame.len() == self.frame_len
    }
}

impl Recipe for MagnitudeSubscription {
    type Output = Vec<f32>;

    fn hash(&self, state: &mut Hasher) {
        let ptr = Arc::as_ptr(&self.receiver) as usize;
        state.write(&ptr.to_ne_bytes());
        state.write_usize(self.frame_len);
    }

    fn stream(
        self: Box<Self>,
        _input: EventStream,
    ) -> futures::stream::BoxStream<'static, Self::Output> {
        futures::stream::unfold(*self, |subscription| async move {
            loop {
                match subscription.receiver.recv().await {
                    Ok(frame) if subscription.accepts(&frame) => {
                        return Some((frame, subscription));
                    }
                    Ok(frame) => warn!(
                        "[ribbon] dropping {}-point frame, expected {}",
                        frame.len(),
                        subscription.frame_len
                    ),
                    Err(_) => {
                        debug!("[ribbon] magnitude stream closed");
                        return None;
                    }
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transform_sized_frames_pass() {
        let (_tx, rx) = async_channel::bounded::<Vec<f32>>(1);
        let subscription = MagnitudeSubscription::new(Arc::new(rx), 512);
        assert!(subscription.accepts(&[0.0; 512]));
        assert!(!subscription.accepts(&[0.0; 256]));
        assert!(!subscription.accepts(&[]));
    }
}
