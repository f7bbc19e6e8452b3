//! Released render targets kept for reuse.
//!
//! Entries are keyed by descriptor and age by one per `tick()` (one per
//! backend flush). Entries idle for `max_idle` ticks expire, and the pool never
//! holds more than `capacity` entries; the oldest is evicted first. Expired and
//! evicted items are handed back to the caller, which owns their destruction.

use taa_core::BufferDesc;

/// Flushes a released texture may sit unused before it is destroyed.
pub const MAX_IDLE_FLUSHES: u32 = 3;
/// Upper bound on pooled textures regardless of age.
pub const POOL_CAPACITY: usize = 8;

struct Entry<T> {
    desc: BufferDesc,
    idle: u32,
    item: T,
}

pub struct TexturePool<T> {
    entries: Vec<Entry<T>>,
    max_idle: u32,
    capacity: usize,
}

impl<T> Default for TexturePool<T> {
    fn default() -> Self {
        Self::new(MAX_IDLE_FLUSHES, POOL_CAPACITY)
    }
}

impl<T> TexturePool<T> {
    pub fn new(max_idle: u32, capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_idle: max_idle.max(1),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the freshest entry matching `desc`.
    pub fn take(&mut self, desc: BufferDesc) -> Option<T> {
        let i = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.desc == desc)
            .min_by_key(|(_, e)| e.idle)
            .map(|(i, _)| i)?;
        Some(self.entries.swap_remove(i).item)
    }

    /// Return an item; yields the evicted entry when the pool was full.
    pub fn put(&mut self, desc: BufferDesc, item: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries
                .iter()
                .enumerate()
                .max_by_key(|(_, e)| e.idle)
                .map(|(i, _)| i)
                .map(|i| self.entries.swap_remove(i).item)
        } else {
            None
        };
        self.entries.push(Entry { desc, idle: 0, item });
        evicted
    }

    /// Age every entry by one flush and return the ones that expired.
    pub fn tick(&mut self) -> Vec<T> {
        let max_idle = self.max_idle;
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for mut e in self.entries.drain(..) {
            e.idle += 1;
            if e.idle >= max_idle {
                expired.push(e.item);
            } else {
                kept.push(e);
            }
        }
        self.entries = kept;
        expired
    }

    pub fn drain(&mut self) -> Vec<T> {
        self.entries.drain(..).map(|e| e.item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taa_core::PixelFormat;

    fn desc(w: u32) -> BufferDesc {
        BufferDesc::new(w, w / 2, PixelFormat::Rgba16Float)
    }

    #[test]
    fn matching_entry_is_reused() {
        let mut pool = TexturePool::default();
        assert!(pool.put(desc(64), 1u32).is_none());
        assert_eq!(pool.take(desc(32)), None);
        assert_eq!(pool.take(desc(64)), Some(1));
        assert!(pool.is_empty());
    }

    #[test]
    fn resize_storm_stays_bounded() {
        // History + scratch released at a new size every frame, one flush per frame.
        let mut pool = TexturePool::default();
        let mut destroyed = 0;
        for frame in 0..40u32 {
            let d = desc(100 + frame * 2);
            destroyed += pool.put(d, frame * 2).is_some() as usize;
            destroyed += pool.put(d, frame * 2 + 1).is_some() as usize;
            destroyed += pool.tick().len();
            assert!(pool.len() <= POOL_CAPACITY);
        }
        assert!(pool.len() <= 2 * (MAX_IDLE_FLUSHES as usize - 1));
        assert_eq!(destroyed + pool.len(), 80);
    }

    #[test]
    fn reuse_resets_age() {
        let mut pool = TexturePool::new(2, 8);
        pool.put(desc(64), 7u32);
        assert!(pool.tick().is_empty());
        let item = pool.take(desc(64)).unwrap();
        pool.put(desc(64), item);
        assert!(pool.tick().is_empty());
        assert_eq!(pool.tick(), vec![7]);
    }

    #[test]
    fn full_pool_evicts_the_oldest() {
        let mut pool = TexturePool::new(10, 2);
        pool.put(desc(10), 'a');
        pool.tick();
        pool.put(desc(20), 'b');
        assert_eq!(pool.put(desc(30), 'c'), Some('a'));
        assert_eq!(pool.len(), 2);
    }
}
