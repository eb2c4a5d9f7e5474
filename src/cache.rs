use crate::consts;

struct Slot {
    block: u32,
    data: Vec<u8>,
}

/// A small direct-mapped cache of decompressed blocks.
///
/// Slot `n mod capacity` holds at most one block; on a collision the
/// newcomer always wins and the previous occupant is simply overwritten.
/// This is deliberately not an LRU: sequential access within a reset
/// interval never collides, and random jumps would miss under almost any
/// eviction policy, so the cheapest correct thing wins. Disjoint from the
/// decompression driver's own "last decoded block" memo (see
/// [`crate::decompress::Decompressor`]) — that memo exists precisely so a
/// cache of size zero still makes sequential reads fast.
pub(crate) struct BlockCache {
    slots: Vec<Option<Slot>>,
}

impl BlockCache {
    pub(crate) fn new(capacity: usize) -> BlockCache {
        let capacity = capacity.min(consts::MAX_CACHE_BLOCKS);
        BlockCache { slots: (0..capacity).map(|_| None).collect() }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn lookup(&self, block: u32) -> Option<&[u8]> {
        if self.slots.is_empty() {
            return None;
        }
        let idx = (block as usize) % self.slots.len();
        match &self.slots[idx] {
            Some(slot) if slot.block == block => Some(&slot.data),
            _ => None,
        }
    }

    /// Returns a buffer to decompress block `b` into, reusing the slot's
    /// existing allocation when there is one. The caller is responsible for
    /// filling it and leaving its length equal to the decompressed size.
    pub(crate) fn install(&mut self, block: u32) -> &mut Vec<u8> {
        let len = self.slots.len();
        let idx = (block as usize) % len;
        let slot = &mut self.slots[idx];
        match slot {
            Some(existing) => {
                existing.block = block;
                existing.data.clear();
            }
            None => {
                *slot = Some(Slot { block, data: Vec::new() });
            }
        }
        &mut slot.as_mut().unwrap().data
    }

    /// Rehashes all occupied slots into a freshly-sized table. On a
    /// collision during rehash, whichever entry is placed first keeps the
    /// slot; the loser is simply dropped. `new_capacity == 0` clears the
    /// cache entirely.
    pub(crate) fn set_capacity(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.min(consts::MAX_CACHE_BLOCKS);
        let mut fresh: Vec<Option<Slot>> = (0..new_capacity).map(|_| None).collect();
        if new_capacity > 0 {
            for slot in self.slots.drain(..).flatten() {
                let idx = (slot.block as usize) % new_capacity;
                if fresh[idx].is_none() {
                    fresh[idx] = Some(slot);
                }
            }
        }
        self.slots = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_then_lookup_round_trips() {
        let mut cache = BlockCache::new(4);
        {
            let buf = cache.install(2);
            buf.extend_from_slice(b"hello");
        }
        assert_eq!(cache.lookup(2), Some(&b"hello"[..]));
        assert_eq!(cache.lookup(6), None); // same slot, different block
    }

    #[test]
    fn collision_newcomer_wins() {
        let mut cache = BlockCache::new(2);
        cache.install(0).extend_from_slice(b"first");
        cache.install(2).extend_from_slice(b"second"); // same slot as 0
        assert_eq!(cache.lookup(0), None);
        assert_eq!(cache.lookup(2), Some(&b"second"[..]));
    }

    #[test]
    fn resize_to_zero_clears_cache() {
        let mut cache = BlockCache::new(4);
        cache.install(1).extend_from_slice(b"x");
        cache.set_capacity(0);
        assert_eq!(cache.lookup(1), None);
        assert_eq!(cache.capacity(), 0);
    }

    #[test]
    fn resize_rehashes_first_come_first_served() {
        let mut cache = BlockCache::new(4);
        cache.install(0).extend_from_slice(b"a");
        cache.install(1).extend_from_slice(b"b");
        cache.set_capacity(1); // both now map to slot 0; block 0 was first
        assert_eq!(cache.lookup(0), Some(&b"a"[..]));
        assert_eq!(cache.lookup(1), None);
    }

    #[test]
    fn capacity_is_clamped_to_maximum() {
        let cache = BlockCache::new(consts::MAX_CACHE_BLOCKS + 100);
        assert_eq!(cache.capacity(), consts::MAX_CACHE_BLOCKS);
    }
}
