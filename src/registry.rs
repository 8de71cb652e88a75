//! A mutex-protected collection of outstanding response sinks, fanned out
//! to by the controller's listener task.

use crate::frame::Frame;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Opaque identity for a registered receiver, used for removal.
///
/// Removal-by-pointer-identity doesn't work once receivers are stored by
/// value in a `Vec` and may be moved, so this mints a monotonically
/// increasing handle on `add` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceiverHandle(u64);

/// A response sink bound to a single transaction id. Created at query
/// start, removed at query end; never shared across queries.
struct Receiver {
    handle: ReceiverHandle,
    tid: u16,
    data: Vec<(SocketAddr, Frame)>,
}

impl Receiver {
    /// Appends `(addr, frame)` if `frame.tid` matches this sink's tid.
    /// Returns whether the frame was accepted.
    fn accept(&mut self, addr: SocketAddr, frame: &Frame) -> bool {
        if frame.tid != self.tid {
            return false;
        }
        self.data.push((addr, frame.clone()));
        true
    }
}

/// The registry shared between the controller's listener task and any
/// number of concurrently calling tasks. All access is serialized by a
/// single mutex around the receiver list.
pub struct ReceiverRegistry {
    next_handle: AtomicU64,
    receivers: Mutex<Vec<Receiver>>,
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(0),
            receivers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a fresh sink for `tid` and returns its handle.
    pub fn add(&self, tid: u16) -> ReceiverHandle {
        let handle = ReceiverHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let mut receivers = self.receivers.lock().expect("receiver registry poisoned");
        receivers.push(Receiver {
            handle,
            tid,
            data: Vec::new(),
        });
        handle
    }

    /// Removes exactly the receiver identified by `handle`, if present, and
    /// returns the `(peer_addr, frame)` pairs it had accumulated.
    pub fn remove(&self, handle: ReceiverHandle) -> Vec<(SocketAddr, Frame)> {
        let mut receivers = self.receivers.lock().expect("receiver registry poisoned");
        if let Some(pos) = receivers.iter().position(|r| r.handle == handle) {
            receivers.remove(pos).data
        } else {
            Vec::new()
        }
    }

    /// Fans a received frame out to every registered sink. Ownership of
    /// `frame` stays with the caller; accepting sinks clone it into their
    /// own buffer, so the registry never retains frames itself.
    pub fn accept_all(&self, addr: SocketAddr, frame: &Frame) {
        let mut receivers = self.receivers.lock().expect("receiver registry poisoned");
        for receiver in receivers.iter_mut() {
            receiver.accept(addr, frame);
        }
    }
}

impl Default for ReceiverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
