//! Chunked byte storage underlying both accumulators.

/// Bytes held by a single chunk.
pub const CHUNK_SIZE: usize = 4096;

/// A fixed-capacity byte buffer. Chunks fill front to back and never
/// shrink; a full chunk stays full until the owning array is reset.
#[derive(Debug)]
pub struct BufferChunk {
    data: Vec<u8>,
}

impl BufferChunk {
    pub fn new() -> Self {
        BufferChunk { data: Vec::with_capacity(CHUNK_SIZE) }
    }

    /// Number of bytes stored so far.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Room left before the chunk is full.
    pub fn available_bytes(&self) -> usize {
        CHUNK_SIZE - self.data.len()
    }

    /// Append as much of `bytes` as fits, returning how many were taken.
    pub fn append_data(&mut self, bytes: &[u8]) -> usize {
        let take = bytes.len().min(self.available_bytes());
        self.data.extend_from_slice(&bytes[..take]);
        take
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Default for BufferChunk {
    fn default() -> Self {
        Self::new()
    }
}

/// An append-only byte store backed by a sequence of [`BufferChunk`]s.
///
/// Only the last chunk can be partially filled, so a byte index maps to a
/// chunk and offset by constant arithmetic and appends never move
/// previously stored bytes.
#[derive(Debug, Default)]
pub struct ChunkArray {
    chunks: Vec<BufferChunk>,
}

impl ChunkArray {
    pub fn new() -> Self {
        ChunkArray { chunks: Vec::new() }
    }

    /// Append `bytes`, growing the chunk list as needed.
    pub fn append_bytes(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            if self.chunks.last().map_or(true, |c| c.available_bytes() == 0) {
                self.chunks.push(BufferChunk::new());
            }
            let taken = self.chunks.last_mut().unwrap().append_data(bytes);
            bytes = &bytes[taken..];
        }
    }

    /// Random read. Returns `None` once `index` is at or past the end.
    pub fn get_byte(&self, index: usize) -> Option<u8> {
        let chunk = self.chunks.get(index / CHUNK_SIZE)?;
        chunk.data().get(index % CHUNK_SIZE).copied()
    }

    /// Total number of stored bytes.
    pub fn len(&self) -> usize {
        match self.chunks.last() {
            Some(last) => (self.chunks.len() - 1) * CHUNK_SIZE + last.data_size(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() || self.len() == 0
    }

    /// Discard all stored bytes.
    pub fn reset(&mut self) {
        self.chunks.clear();
    }

    /// Materialize a contiguous copy of the stored bytes.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk.data());
        }
        out
    }
}
