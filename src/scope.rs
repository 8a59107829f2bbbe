//! Mono snapshots of the last processed block, for a display to poll.
//!
//! The audio thread overwrites both frames every block with relaxed atomic stores. Readers get no
//! synchronization at all, so a read that overlaps a write may see part of each block. That only
//! costs a glitchy frame on screen.

use arc_swap::ArcSwap;
use nih_plug::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Input (before processing) and output (after processing) frames of equal length.
pub struct ScopeFrames {
    input: Box<[AtomicF32]>,
    output: Box<[AtomicF32]>,
}

impl ScopeFrames {
    fn new(len: usize) -> Self {
        Self {
            input: (0..len).map(|_| AtomicF32::new(0.0)).collect(),
            output: (0..len).map(|_| AtomicF32::new(0.0)).collect(),
        }
    }

}

/// Writer side, owned by the block processor.
pub struct Scope {
    frames: Arc<ScopeFrames>,
    shared: Arc<ArcSwap<ScopeFrames>>,
}

/// Reader side, handed out to the display layer.
#[derive(Clone)]
pub struct ScopeHandle {
    shared: Arc<ArcSwap<ScopeFrames>>,
}

impl Scope {
    pub fn new(len: usize) -> (Self, ScopeHandle) {
        let frames = Arc::new(ScopeFrames::new(len));
        let shared = Arc::new(ArcSwap::new(Arc::clone(&frames)));

        (
            Self {
                frames,
                shared: Arc::clone(&shared),
            },
            ScopeHandle { shared },
        )
    }

    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Replaces both frames with zeroed ones of `len` samples. Existing handles see the new frames
    /// on their next read.
    ///
    /// This allocates, so it must not be called from the audio thread.
    pub fn resize(&mut self, len: usize) {
        if len == self.frames.input.len() {
            return;
        }

        self.frames = Arc::new(ScopeFrames::new(len));
        self.shared.store(Arc::clone(&self.frames));
    }

    pub fn write_input(&self, samples: &[f32]) {
        write_frame(&self.frames.input, samples);
    }

    pub fn write_output(&self, samples: &[f32]) {
        write_frame(&self.frames.output, samples);
    }

    pub fn clear(&self) {
        write_frame(&self.frames.input, &[]);
        write_frame(&self.frames.output, &[]);
    }
}

impl ScopeHandle {
    pub fn len(&self) -> usize {
        self.shared.load().input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the most recent input frame.
    pub fn input_buffer(&self) -> Vec<f32> {
        let mut samples = Vec::new();
        self.read_input_into(&mut samples);
        samples
    }

    /// A copy of the most recent output frame.
    pub fn output_buffer(&self) -> Vec<f32> {
        let mut samples = Vec::new();
        self.read_output_into(&mut samples);
        samples
    }

    /// Like [`input_buffer()`][Self::input_buffer()], but reuses `dst`.
    pub fn read_input_into(&self, dst: &mut Vec<f32>) {
        read_frame(&self.shared.load().input, dst);
    }

    pub fn read_output_into(&self, dst: &mut Vec<f32>) {
        read_frame(&self.shared.load().output, dst);
    }
}

/// Copies as much of `samples` as fits and zeroes whatever is left of the frame.
fn write_frame(frame: &[AtomicF32], samples: &[f32]) {
    let copied = samples.len().min(frame.len());
    for (slot, &sample) in frame.iter().zip(&samples[..copied]) {
        slot.store(sample, Ordering::Relaxed);
    }
    for slot in &frame[copied..] {
        slot.store(0.0, Ordering::Relaxed);
    }
}

fn read_frame(frame: &[AtomicF32], dst: &mut Vec<f32>) {
    dst.clear();
    dst.extend(frame.iter().map(|slot| slot.load(Ordering::Relaxed)));
}
