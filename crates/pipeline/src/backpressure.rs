//! Audio backpressure: two disciplines depending on whether the wake gate
//! has fired yet. Before the gate, a full queue drops its oldest frame to
//! admit the new one — the capture task must never block. After the gate,
//! a full queue blocks the producer up to a deadline and surfaces
//! `Error::StageTimeout` rather than ever dropping audio mid-utterance.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use vox_core::{AudioFrame, Error, Result};

/// Pre-wake-gate queue. Sized by `CoreConfig::audio_prequeue_depth`.
pub struct PreGateQueue {
    inner: Mutex<VecDeque<AudioFrame>>,
    capacity: usize,
}

impl PreGateQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Never blocks: drops the oldest queued frame first if at capacity.
    pub async fn push(&self, frame: AudioFrame) {
        let mut guard = self.inner.lock().await;
        if guard.len() >= self.capacity {
            guard.pop_front();
        }
        guard.push_back(frame);
    }

    /// Drains every buffered frame, oldest first — used once the wake gate
    /// fires, to hand the pre-roll audio on to ASR alongside live capture.
    pub async fn drain(&self) -> Vec<AudioFrame> {
        let mut guard = self.inner.lock().await;
        guard.drain(..).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Post-wake-gate queue. Sized by `WebApiConfig::ws_audio_queue_depth` (or
/// an equivalent transport-level bound).
pub struct PostGateQueue {
    inner: Mutex<VecDeque<AudioFrame>>,
    capacity: usize,
    not_full: Notify,
    not_empty: Notify,
}

impl PostGateQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            not_full: Notify::new(),
            not_empty: Notify::new(),
        }
    }

    /// Blocks until a slot is free, up to `deadline`. Times out as
    /// `Error::StageTimeout { stage: "asr", .. }` instead of dropping the
    /// frame.
    pub async fn push(&self, frame: AudioFrame, deadline: Duration) -> Result<()> {
        tokio::time::timeout(deadline, self.push_blocking(frame))
            .await
            .map_err(|_| Error::StageTimeout {
                stage: "asr".to_string(),
                elapsed_ms: deadline.as_millis() as u64,
            })
    }

    async fn push_blocking(&self, frame: AudioFrame) {
        loop {
            {
                let mut guard = self.inner.lock().await;
                if guard.len() < self.capacity {
                    guard.push_back(frame);
                    self.not_empty.notify_one();
                    return;
                }
            }
            self.not_full.notified().await;
        }
    }

    pub async fn pop(&self) -> AudioFrame {
        loop {
            {
                let mut guard = self.inner.lock().await;
                if let Some(frame) = guard.pop_front() {
                    self.not_full.notify_one();
                    return frame;
                }
            }
            self.not_empty.notified().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: usize) -> AudioFrame {
        AudioFrame::new(vec![n as f32], 16000, 1)
    }

    #[tokio::test]
    async fn pre_gate_drops_oldest_when_full() {
        let queue = PreGateQueue::new(2);
        queue.push(frame(1)).await;
        queue.push(frame(2)).await;
        queue.push(frame(3)).await;
        let drained = queue.drain().await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].samples, vec![2.0]);
        assert_eq!(drained[1].samples, vec![3.0]);
    }

    #[tokio::test]
    async fn post_gate_pop_returns_in_fifo_order() {
        let queue = PostGateQueue::new(4);
        queue.push(frame(1), Duration::from_millis(100)).await.unwrap();
        queue.push(frame(2), Duration::from_millis(100)).await.unwrap();
        assert_eq!(queue.pop().await.samples, vec![1.0]);
        assert_eq!(queue.pop().await.samples, vec![2.0]);
    }

    #[tokio::test]
    async fn post_gate_push_times_out_when_never_drained() {
        let queue = PostGateQueue::new(1);
        queue.push(frame(1), Duration::from_millis(50)).await.unwrap();
        let err = queue.push(frame(2), Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, Error::StageTimeout { stage, .. } if stage == "asr"));
    }
}
