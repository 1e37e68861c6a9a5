//! Fixed-capacity byte ring buffer carrying PCM bytes from the audio
//! callback to the detector task. Writes are overwrite-on-full so the
//! audio-producing side never blocks; reads advance the tail under the same
//! lock. `available() + free_space() == capacity` holds after every
//! operation.

use parking_lot::Mutex;

struct Inner {
    buf: Vec<u8>,
    head: usize,
    tail: usize,
    full: bool,
}

pub struct RingBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be greater than zero");
        Self {
            inner: Mutex::new(Inner {
                buf: vec![0u8; capacity],
                head: 0,
                tail: 0,
                full: false,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Writes every byte of `data`. Never blocks: once full, each new byte
    /// evicts the oldest buffered byte.
    pub fn write(&self, data: &[u8]) {
        let mut inner = self.inner.lock();
        for &byte in data {
            if inner.full {
                inner.tail = (inner.tail + 1) % self.capacity;
            }
            inner.buf[inner.head] = byte;
            inner.head = (inner.head + 1) % self.capacity;
            inner.full = inner.head == inner.tail;
        }
    }

    /// Reads up to `out.len()` bytes, advancing the tail. Returns the number
    /// of bytes actually read.
    pub fn read(&self, out: &mut [u8]) -> usize {
        let mut inner = self.inner.lock();
        let n = out.len().min(Self::available_locked(&inner, self.capacity));
        for slot in out.iter_mut().take(n) {
            *slot = inner.buf[inner.tail];
            inner.tail = (inner.tail + 1) % self.capacity;
            inner.full = false;
        }
        n
    }

    /// Reads the most recently written `out.len()` bytes without consuming
    /// them, oldest-to-newest. Short if fewer than `out.len()` bytes are
    /// buffered. Used by the MFCC frontend to look back over the trailing
    /// window without disturbing the reader's own tail position.
    pub fn peek_latest(&self, out: &mut [u8]) -> usize {
        let inner = self.inner.lock();
        let available = Self::available_locked(&inner, self.capacity);
        let n = out.len().min(available);
        let start = (inner.head + self.capacity - n) % self.capacity;
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = inner.buf[(start + i) % self.capacity];
        }
        n
    }

    pub fn available(&self) -> usize {
        let inner = self.inner.lock();
        Self::available_locked(&inner, self.capacity)
    }

    pub fn free_space(&self) -> usize {
        self.capacity - self.available()
    }

    fn available_locked(inner: &Inner, capacity: usize) -> usize {
        if inner.full {
            capacity
        } else if inner.head >= inner.tail {
            inner.head - inner.tail
        } else {
            capacity - inner.tail + inner.head
        }
    }
}
