/// Builder for the fixed-layout records of the zip format. Every multibyte
/// field is little-endian.
#[derive(Debug, Default)]
pub(crate) struct RecordBuffer {
    buffer: Vec<u8>,
}

impl RecordBuffer {
    pub fn with_capacity(capacity: usize) -> RecordBuffer {
        RecordBuffer {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u16(&mut self, val: u16) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u32(&mut self, val: u32) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u64(&mut self, val: u64) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_bytes(&mut self, val: &[u8]) {
        self.buffer.extend_from_slice(val);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}
