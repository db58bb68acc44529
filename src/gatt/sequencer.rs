//! Single-outstanding-request sequencing for GATT reads and CCCD writes.
//!
//! The platform stack accepts one request of each class at a time; a
//! second one issued while the first is pending is silently lost on real
//! hardware. Each class gets its own FIFO. The head entry is the one in
//! flight, so a push only issues a transport call when the queue was empty.
//!
//! ```text
//!   enqueue ──▶ [ head* | e1 | e2 | … ]      * = outstanding with transport
//!                  │
//!   completion ────┘ pop head ──▶ issue e1 (if any)
//! ```

use heapless::Deque;

use super::uuids::ENABLE_NOTIFICATION_VALUE;
use super::{CharHandle, DescHandle, TransportRequest};

/// Per-class queue depth. Comfortably above the nine initial reads.
pub const QUEUE_DEPTH: usize = 16;

/// A completion arrived for a handle that is not at the head of its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotHead;

/// The queue is at capacity; the entry was not added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

// ---------------------------------------------------------------------------
// Generic FIFO
// ---------------------------------------------------------------------------

/// Bounded FIFO whose head is the request currently in flight.
#[derive(Debug)]
pub struct OpQueue<H> {
    entries: Deque<H, QUEUE_DEPTH>,
}

impl<H: Copy + PartialEq> OpQueue<H> {
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Append `handle`. `Ok(true)` means it became head and must be issued now.
    pub fn push(&mut self, handle: H) -> Result<bool, QueueFull> {
        let was_empty = self.entries.is_empty();
        self.entries.push_back(handle).map_err(|_| QueueFull)?;
        Ok(was_empty)
    }

    /// Pop the head for a completion of `handle` and return the next entry
    /// to issue, if any. A non-head completion leaves the queue untouched.
    pub fn complete(&mut self, handle: H) -> Result<Option<H>, NotHead> {
        if self.entries.front() != Some(&handle) {
            return Err(NotHead);
        }
        self.entries.pop_front();
        Ok(self.entries.front().copied())
    }

    /// The entry currently outstanding with the transport.
    pub fn in_flight(&self) -> Option<H> {
        self.entries.front().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry without completing it. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}

impl<H: Copy + PartialEq> Default for OpQueue<H> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// The two independent request queues of one session.
#[derive(Debug, Default)]
pub struct OperationSequencer {
    reads: OpQueue<CharHandle>,
    descriptor_writes: OpQueue<DescHandle>,
}

impl OperationSequencer {
    pub const fn new() -> Self {
        Self {
            reads: OpQueue::new(),
            descriptor_writes: OpQueue::new(),
        }
    }

    /// Queue a characteristic read. Returns the request to issue if the
    /// read became head of the queue.
    pub fn enqueue_read(&mut self, handle: CharHandle) -> Result<Option<TransportRequest>, QueueFull> {
        Ok(self
            .reads
            .push(handle)?
            .then_some(TransportRequest::Read(handle)))
    }

    /// Queue a notification-enable write to `handle`.
    pub fn enqueue_descriptor_write(
        &mut self,
        handle: DescHandle,
    ) -> Result<Option<TransportRequest>, QueueFull> {
        Ok(self
            .descriptor_writes
            .push(handle)?
            .then_some(descriptor_request(handle)))
    }

    /// Advance the read queue after a completion, successful or not.
    pub fn on_read_completed(
        &mut self,
        handle: CharHandle,
    ) -> Result<Option<TransportRequest>, NotHead> {
        Ok(self.reads.complete(handle)?.map(TransportRequest::Read))
    }

    /// Advance the descriptor-write queue after a completion.
    pub fn on_descriptor_write_completed(
        &mut self,
        handle: DescHandle,
    ) -> Result<Option<TransportRequest>, NotHead> {
        Ok(self
            .descriptor_writes
            .complete(handle)?
            .map(descriptor_request))
    }

    pub fn read_in_flight(&self) -> Option<CharHandle> {
        self.reads.in_flight()
    }

    pub fn descriptor_write_in_flight(&self) -> Option<DescHandle> {
        self.descriptor_writes.in_flight()
    }

    pub fn pending_reads(&self) -> usize {
        self.reads.len()
    }

    pub fn pending_descriptor_writes(&self) -> usize {
        self.descriptor_writes.len()
    }

    pub fn is_idle(&self) -> bool {
        self.reads.is_empty() && self.descriptor_writes.is_empty()
    }

    /// Drop every pending entry in both queues. Returns the total dropped.
    pub fn clear(&mut self) -> usize {
        self.reads.clear() + self.descriptor_writes.clear()
    }
}

fn descriptor_request(handle: DescHandle) -> TransportRequest {
    TransportRequest::WriteDescriptor(handle, ENABLE_NOTIFICATION_VALUE)
}
