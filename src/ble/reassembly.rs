//! Fragmented characteristic-write reassembly.
//!
//! BLE limits a single write to the negotiated ATT payload (20 bytes at the
//! default MTU), so longer provisioning payloads arrive as several writes at
//! increasing offsets. The transport carries no explicit end-of-payload
//! marker; a write is treated as the final fragment when it is shorter than
//! the negotiated unit or when it was sent without response. A whole payload
//! that fits in a single write is complete immediately via the short-fragment
//! clause; an exact multiple of the unit needs a without-response tail or an
//! empty terminating write.
//!
//! At most one logical write is in flight per characteristic: while a
//! reassembly is in progress, a new write starting at offset 0 is rejected
//! busy rather than queued, so two logical payloads can never interleave.

use log::debug;

/// ATT write payload at the default MTU of 23 (3-byte ATT header).
pub const DEFAULT_WRITE_UNIT: usize = 20;

/// ATT header length subtracted from a negotiated MTU.
const ATT_HEADER_LEN: usize = 3;

/// Result of submitting one write fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Fragment accepted, more expected.
    Partial,
    /// Final fragment received; the reassembled payload is returned and the
    /// buffer is cleared for the next logical write.
    Complete(Vec<u8>),
    /// A reassembly is already in progress; the write was not accepted.
    RejectedBusy,
    /// Offset does not match the assembly state.
    InvalidOffset,
}

/// Per-characteristic write assembly buffer.
#[derive(Debug)]
pub struct WriteReassembler {
    buffer: Vec<u8>,
    busy: bool,
    write_unit: usize,
}

impl Default for WriteReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteReassembler {
    /// Create an idle reassembler with the default write unit.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            busy: false,
            write_unit: DEFAULT_WRITE_UNIT,
        }
    }

    /// Whether a reassembly is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Bytes accumulated so far.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Current final-fragment threshold.
    pub fn write_unit(&self) -> usize {
        self.write_unit
    }

    /// Recompute the write unit from a newly negotiated MTU.
    pub fn update_mtu(&mut self, mtu: usize) {
        let unit = mtu.saturating_sub(ATT_HEADER_LEN).max(1);
        debug!("Write unit {} -> {} (MTU {})", self.write_unit, unit, mtu);
        self.write_unit = unit;
    }

    /// Submit one write fragment.
    pub fn on_write(&mut self, data: &[u8], offset: usize, without_response: bool) -> WriteOutcome {
        if offset == 0 {
            if self.busy {
                debug!(
                    "Write rejected: reassembly in progress ({} bytes buffered)",
                    self.buffer.len()
                );
                return WriteOutcome::RejectedBusy;
            }
            self.busy = true;
            self.buffer.clear();
            self.buffer.extend_from_slice(data);
        } else {
            if !self.busy || offset != self.buffer.len() {
                debug!(
                    "Write rejected: offset {} does not continue assembly at {}",
                    offset,
                    self.buffer.len()
                );
                return WriteOutcome::InvalidOffset;
            }
            self.buffer.extend_from_slice(data);
        }

        let is_final = data.len() < self.write_unit || without_response;
        if !is_final {
            debug!("Partial write accepted, buffer size: {}", self.buffer.len());
            return WriteOutcome::Partial;
        }

        let payload = std::mem::take(&mut self.buffer);
        self.busy = false;
        debug!("Write complete, total size: {}", payload.len());
        WriteOutcome::Complete(payload)
    }

    /// Drop any partial assembly and clear the busy flag.
    ///
    /// Called when the writing client disconnects mid-payload so the next
    /// client starts from a clean buffer.
    pub fn reset(&mut self) {
        if self.busy || !self.buffer.is_empty() {
            debug!("Discarding partial write ({} bytes)", self.buffer.len());
        }
        self.buffer.clear();
        self.busy = false;
    }
}
