//! Capture source abstraction and the shared sample sink the pump drains.

use std::sync::{Arc, Mutex};

use super::CaptureError;

/// Samples accumulated by a capture callback, drained by the graph pump.
///
/// The cpal callback thread pushes, the pump task drains; both sides only
/// hold the lock for the length of one block.
#[derive(Clone, Default)]
pub struct SampleBuffer {
    inner: Arc<Mutex<Vec<f32>>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, block: &[f32]) {
        if let Ok(mut samples) = self.inner.lock() {
            samples.extend_from_slice(block);
        }
    }

    /// Take everything buffered since the last drain.
    pub fn drain(&self) -> Vec<f32> {
        match self.inner.lock() {
            Ok(mut samples) => std::mem::take(&mut *samples),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for live capture sources (system audio monitor, microphone).
///
/// Sources feed a [`SampleBuffer`] from their callback; the graph owns a
/// clone of the buffer and never touches the source itself while pumping.
pub trait CaptureSource {
    /// Start capturing. Fails if the underlying stream cannot be built.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop capturing. Safe to call when already stopped.
    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// Sample rate the callback delivers at.
    fn sample_rate(&self) -> u32;

    /// Handle to the buffer this source fills.
    fn buffer(&self) -> SampleBuffer;
}
