//! History buffer: the previous frame's resolved output.
//!
//! At most one buffer is live. It is (re)allocated lazily whenever the source
//! extent or format changes and seeded with the source so the first resolve
//! after an allocation blends the frame with itself.

use crate::error::TaaError;
use crate::gpu::{BufferDesc, GpuBackend};

pub const HISTORY_LABEL: &str = "taa.history";

pub struct HistoryBuffer<G: GpuBackend> {
    buffer: Option<G::Buffer>,
    desc: Option<BufferDesc>,
}

impl<G: GpuBackend> Default for HistoryBuffer<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GpuBackend> HistoryBuffer<G> {
    pub fn new() -> Self {
        Self {
            buffer: None,
            desc: None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn desc(&self) -> Option<BufferDesc> {
        self.desc
    }

    pub fn get(&self) -> Option<&G::Buffer> {
        self.buffer.as_ref()
    }

    /// Return a history buffer matching `source`, reallocating and seeding it
    /// from `source` when the current one is missing or stale.
    pub fn ensure(&mut self, gpu: &mut G, source: &G::Buffer) -> Result<&G::Buffer, TaaError> {
        let want = gpu.describe(source)?;
        if self.buffer.is_none() || self.desc != Some(want) {
            if let Some(old) = self.desc {
                log::debug!(
                    "taa history {}x{} {:?} -> {}x{} {:?}",
                    old.width,
                    old.height,
                    old.format,
                    want.width,
                    want.height,
                    want.format
                );
            }
            self.release(gpu);
            let fresh = gpu.allocate(want, HISTORY_LABEL)?;
            if let Err(e) = gpu.blit(source, &fresh) {
                gpu.release(fresh);
                return Err(e);
            }
            self.buffer = Some(fresh);
            self.desc = Some(want);
        }
        self.buffer.as_ref().ok_or(TaaError::UnknownBuffer)
    }

    /// Free the buffer if one is held.
    pub fn release(&mut self, gpu: &mut G) {
        if let Some(buf) = self.buffer.take() {
            gpu.release(buf);
        }
        self.desc = None;
    }
}
