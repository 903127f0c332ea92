/// Ordered accumulator for encoded media chunks of one recording pass.
///
/// Wrap in `Arc<parking_lot::Mutex<ChunkBuffer>>` to share it with the
/// encoder callback. Once sealed, further chunks are rejected so nothing can
/// be appended after finalization.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: usize,
    sealed: bool,
    rejected: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk in delivery order.
    ///
    /// Empty chunks are ignored. Returns whether the chunk was kept.
    pub fn push(&mut self, chunk: Vec<u8>) -> bool {
        if self.sealed {
            self.rejected += 1;
            log::warn!("Dropping {} byte chunk delivered after finalization", chunk.len());
            return false;
        }
        if chunk.is_empty() {
            return false;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    /// Seal the buffer and return all chunks concatenated.
    pub fn seal(&mut self) -> Vec<u8> {
        self.sealed = true;
        let mut media = Vec::with_capacity(self.total_bytes);
        for chunk in self.chunks.drain(..) {
            media.extend_from_slice(&chunk);
        }
        self.total_bytes = 0;
        media
    }

    /// Seal the buffer and drop everything it holds.
    pub fn discard(&mut self) {
        self.sealed = true;
        self.chunks.clear();
        self.total_bytes = 0;
    }

    /// Number of chunks currently held.
    pub fn count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Chunks refused because they arrived after sealing.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_concatenate_in_order() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1, 2]);
        buf.push(vec![3]);
        buf.push(vec![4, 5, 6]);

        assert_eq!(buf.count(), 3);
        assert_eq!(buf.total_bytes(), 6);
        assert_eq!(buf.seal(), vec![1, 2, 3, 4, 5, 6]);
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_chunks_are_ignored() {
        let mut buf = ChunkBuffer::new();
        assert!(!buf.push(Vec::new()));
        assert!(buf.is_empty());
        assert!(buf.seal().is_empty());
    }

    #[test]
    fn sealed_buffer_rejects_late_chunks() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1]);
        buf.seal();

        assert!(!buf.push(vec![2]));
        assert_eq!(buf.rejected(), 1);
        assert!(buf.is_empty());
    }

    #[test]
    fn discard_drops_data_and_seals() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1, 2, 3]);
        buf.discard();

        assert!(buf.is_sealed());
        assert_eq!(buf.total_bytes(), 0);
        assert!(!buf.push(vec![4]));
    }
}
