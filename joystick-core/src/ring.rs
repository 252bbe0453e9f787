//! Fixed-capacity byte FIFO shared between the receive context and the
//! report context.
//!
//! The buffer borrows caller-owned atomic slots and is split into exactly one
//! [`Producer`] and one [`Consumer`]. The producer owns the tail index, the
//! consumer owns the head index, and the shared `count` is the only value
//! both sides modify. Slots are accessed with relaxed loads and stores; a
//! slot is published by the release increment of `count` and handed back by
//! the release decrement. Neither side ever blocks.
//!
//! When the buffer is full, [`Producer::insert`] drops the incoming byte and
//! increments an overflow counter instead of overwriting unread data.
//!
//! # Example
//!
//! ```
//! use joystick_core::RingBuffer;
//! use portable_atomic::AtomicU8;
//!
//! let storage = [const { AtomicU8::new(0) }; 4];
//! let mut ring = RingBuffer::new(&storage);
//! let (mut producer, mut consumer) = ring.split();
//!
//! producer.insert(0x05).unwrap();
//! producer.insert(0x01).unwrap();
//! assert_eq!(consumer.count(), 2);
//! assert_eq!(consumer.remove(), Some(0x05));
//! assert_eq!(consumer.remove(), Some(0x01));
//! assert_eq!(consumer.remove(), None);
//! ```

use portable_atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

/// Circular byte buffer over a caller-supplied backing store.
pub struct RingBuffer<'a> {
    storage: &'a [AtomicU8],
    /// Next slot to read. Written only by the consumer.
    head: AtomicUsize,
    /// Next slot to write. Written only by the producer.
    tail: AtomicUsize,
    /// Unread bytes, `0 <= count <= capacity`.
    count: AtomicUsize,
    /// Bytes dropped because the buffer was full.
    overflows: AtomicU32,
}

impl<'a> RingBuffer<'a> {
    /// Bind an empty ring buffer to `storage`.
    ///
    /// The capacity is `storage.len()`. Existing contents of `storage` are
    /// ignored.
    #[must_use]
    pub fn new(storage: &'a [AtomicU8]) -> Self {
        Self {
            storage,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
            overflows: AtomicU32::new(0),
        }
    }

    /// Split the buffer into its producer and consumer halves.
    pub fn split(&mut self) -> (Producer<'_>, Consumer<'_>) {
        let ring: &RingBuffer<'a> = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Total number of bytes the buffer can hold.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of unread bytes.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Number of bytes dropped so far because the buffer was full.
    ///
    /// Wraps on overflow of the counter itself.
    #[inline]
    #[must_use]
    pub fn overflows(&self) -> u32 {
        self.overflows.load(Ordering::Relaxed)
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.capacity() {
            0
        } else {
            next
        }
    }

    /// Must only be called from the single producer.
    fn enqueue(&self, byte: u8) -> Result<(), u8> {
        if self.count.load(Ordering::Acquire) >= self.capacity() {
            self.overflows.fetch_add(1, Ordering::Relaxed);
            return Err(byte);
        }

        let tail = self.tail.load(Ordering::Relaxed);
        self.storage[tail].store(byte, Ordering::Relaxed);
        self.tail.store(self.advance(tail), Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Must only be called from the single consumer.
    fn dequeue(&self) -> Option<u8> {
        if self.count.load(Ordering::Acquire) == 0 {
            return None;
        }

        let head = self.head.load(Ordering::Relaxed);
        let byte = self.storage[head].load(Ordering::Relaxed);
        self.head.store(self.advance(head), Ordering::Relaxed);
        self.count.fetch_sub(1, Ordering::AcqRel);
        Some(byte)
    }
}

/// Writing half of a [`RingBuffer`]. Lives in the receive (interrupt) context.
pub struct Producer<'r> {
    ring: &'r RingBuffer<'r>,
}

impl Producer<'_> {
    /// Append one byte at the tail.
    ///
    /// Returns the byte back as `Err` if the buffer is full; the byte is
    /// dropped and [`overflows`](Self::overflows) is incremented.
    #[inline]
    pub fn insert(&mut self, byte: u8) -> Result<(), u8> {
        self.ring.enqueue(byte)
    }

    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.ring.count()
    }

    #[inline]
    #[must_use]
    pub fn overflows(&self) -> u32 {
        self.ring.overflows()
    }
}

/// Reading half of a [`RingBuffer`]. Lives in the report (main loop) context.
pub struct Consumer<'r> {
    ring: &'r RingBuffer<'r>,
}

impl Consumer<'_> {
    /// Pop the oldest byte, or `None` if the buffer is empty.
    #[inline]
    pub fn remove(&mut self) -> Option<u8> {
        self.ring.dequeue()
    }

    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.ring.count()
    }

    #[inline]
    #[must_use]
    pub fn overflows(&self) -> u32 {
        self.ring.overflows()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::thread;
    use std::vec::Vec;

    #[test]
    fn test_new_buffer_is_empty() {
        let storage = [const { AtomicU8::new(0xAA) }; 16];
        let mut ring = RingBuffer::new(&storage);
        assert_eq!(ring.capacity(), 16);
        assert_eq!(ring.count(), 0);
        assert_eq!(ring.overflows(), 0);

        let (_producer, mut consumer) = ring.split();
        assert_eq!(consumer.remove(), None);
    }

    #[test]
    fn test_remove_from_empty_returns_none() {
        let storage = [const { AtomicU8::new(0) }; 4];
        let mut ring = RingBuffer::new(&storage);
        let (_producer, mut consumer) = ring.split();
        assert_eq!(consumer.remove(), None);
        assert_eq!(consumer.count(), 0);
    }

    #[test]
    fn test_fill_to_capacity_preserves_order() {
        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, mut consumer) = ring.split();

        for byte in 0..16u8 {
            assert_eq!(producer.insert(byte), Ok(()));
        }
        assert_eq!(producer.count(), 16);

        for expected in 0..16u8 {
            assert_eq!(consumer.remove(), Some(expected));
        }
        assert_eq!(consumer.remove(), None);
    }

    #[test]
    fn test_insert_when_full_drops_newest() {
        let storage = [const { AtomicU8::new(0) }; 4];
        let mut ring = RingBuffer::new(&storage);
        {
            let (mut producer, mut consumer) = ring.split();
            for byte in [1, 2, 3, 4] {
                producer.insert(byte).unwrap();
            }

            assert_eq!(producer.insert(5), Err(5));
            assert_eq!(producer.insert(6), Err(6));
            assert_eq!(producer.overflows(), 2);
            assert_eq!(producer.count(), 4);

            assert_eq!(consumer.remove(), Some(1));
            assert_eq!(consumer.remove(), Some(2));
            assert_eq!(consumer.remove(), Some(3));
            assert_eq!(consumer.remove(), Some(4));
            assert_eq!(consumer.remove(), None);
        }
        assert_eq!(ring.overflows(), 2);
    }

    #[test]
    fn test_wraps_around_storage_end() {
        let storage = [const { AtomicU8::new(0) }; 3];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, mut consumer) = ring.split();

        let mut next_in = 0u8;
        let mut next_out = 0u8;
        for _ in 0..10 {
            producer.insert(next_in).unwrap();
            producer.insert(next_in + 1).unwrap();
            next_in += 2;

            assert_eq!(consumer.remove(), Some(next_out));
            assert_eq!(consumer.remove(), Some(next_out + 1));
            next_out += 2;
        }
        assert_eq!(consumer.count(), 0);
    }

    #[test]
    fn test_space_is_reusable_after_remove() {
        let storage = [const { AtomicU8::new(0) }; 2];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, mut consumer) = ring.split();

        producer.insert(1).unwrap();
        producer.insert(2).unwrap();
        assert!(producer.insert(3).is_err());

        assert_eq!(consumer.remove(), Some(1));
        assert_eq!(producer.insert(3), Ok(()));
        assert_eq!(consumer.remove(), Some(2));
        assert_eq!(consumer.remove(), Some(3));
        assert_eq!(producer.overflows(), 1);
    }

    #[test]
    fn test_zero_capacity_drops_everything() {
        let storage: [AtomicU8; 0] = [];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, mut consumer) = ring.split();

        assert_eq!(producer.insert(9), Err(9));
        assert_eq!(consumer.remove(), None);
        assert_eq!(consumer.overflows(), 1);
    }

    #[test]
    fn test_halves_can_move_to_other_contexts() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_sync::<RingBuffer<'static>>();
        assert_send::<Producer<'static>>();
        assert_send::<Consumer<'static>>();
    }

    #[test]
    fn test_producer_thread_and_consumer_thread() {
        const TOTAL: usize = 10_000;

        let storage = [const { AtomicU8::new(0) }; 16];
        let mut ring = RingBuffer::new(&storage);
        let (mut producer, mut consumer) = ring.split();

        let received = thread::scope(|s| {
            s.spawn(move || {
                for i in 0..TOTAL {
                    let byte = (i % 251) as u8;
                    while producer.insert(byte).is_err() {
                        thread::yield_now();
                    }
                }
            });

            let mut received = Vec::with_capacity(TOTAL);
            while received.len() < TOTAL {
                match consumer.remove() {
                    Some(byte) => received.push(byte),
                    None => thread::yield_now(),
                }
            }
            received
        });

        for (i, byte) in received.iter().enumerate() {
            assert_eq!(*byte, (i % 251) as u8);
        }
    }
}
