// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Descriptor multiplexing for the dispatch thread.
//!
//! [`PollSet`] wraps one epoll instance; the dispatch thread registers the
//! compositor socket, an internal wake descriptor, and every auxiliary
//! [`EventSource`] with it, and blocks in [`PollSet::wait`] between protocol
//! cycles. Auxiliary sources are keyed by their raw descriptor, which doubles
//! as the epoll token.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::sync::Mutex;

use rustix::buffer::spare_capacity;
use rustix::event::epoll;
use rustix::io::Errno;

use crate::display::EventRouter;
use crate::error::DisplayError;

/// Ready condition bits reported for a descriptor.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Readiness {
    /// Data can be read without blocking.
    pub readable: bool,
    /// The peer hung up or the descriptor is in an error state.
    pub hangup: bool,
}

impl Readiness {
    fn from_flags(flags: epoll::EventFlags) -> Self {
        Self {
            readable: flags.contains(epoll::EventFlags::IN),
            hangup: flags.intersects(epoll::EventFlags::HUP | epoll::EventFlags::ERR),
        }
    }
}

/// What the multiplexer should do with a source after dispatching it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceAction {
    /// Keep watching the descriptor.
    Continue,
    /// Unregister the source and drop it.
    Remove,
}

/// An auxiliary descriptor-driven event source.
///
/// Sources are dispatched synchronously on the dispatch thread, in the order
/// the kernel reports readiness within one wait. Implementations must keep
/// their descriptor in non-blocking mode and drain it fully on each call.
pub trait EventSource: Send {
    /// The descriptor to watch for readability.
    fn fd(&self) -> BorrowedFd<'_>;

    /// Called when the descriptor is ready.
    fn ready(
        &mut self,
        router: &mut EventRouter<'_>,
        readiness: Readiness,
    ) -> Result<SourceAction, DisplayError>;
}

/// One readiness report from a wait.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ready {
    pub(crate) token: u64,
    pub(crate) readiness: Readiness,
}

/// A level-triggered epoll instance.
pub(crate) struct PollSet {
    epoll: OwnedFd,
}

impl std::fmt::Debug for PollSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollSet")
            .field("epoll", &self.epoll.as_raw_fd())
            .finish()
    }
}

impl PollSet {
    pub(crate) fn new() -> io::Result<Self> {
        let epoll = epoll::create(epoll::CreateFlags::CLOEXEC)?;
        Ok(Self { epoll })
    }

    /// Watches `fd` for readability under `token`.
    pub(crate) fn add(&self, fd: BorrowedFd<'_>, token: u64) -> io::Result<()> {
        epoll::add(
            &self.epoll,
            fd,
            epoll::EventData::new_u64(token),
            epoll::EventFlags::IN,
        )?;
        Ok(())
    }

    pub(crate) fn remove(&self, fd: BorrowedFd<'_>) -> io::Result<()> {
        epoll::delete(&self.epoll, fd)?;
        Ok(())
    }

    /// Blocks until at least one descriptor is ready, appending reports to
    /// `ready`. Interruption by a signal is retried.
    pub(crate) fn wait(&self, ready: &mut Vec<Ready>) -> io::Result<()> {
        let mut events = Vec::with_capacity(16);
        loop {
            match epoll::wait(&self.epoll, spare_capacity(&mut events), None) {
                Ok(_) => break,
                Err(Errno::INTR) => continue,
                Err(errno) => return Err(errno.into()),
            }
        }
        ready.extend(events.iter().map(|event| Ready {
            token: event.data.u64(),
            readiness: Readiness::from_flags(event.flags),
        }));
        Ok(())
    }
}

/// The table of registered auxiliary sources, shared between the dispatch
/// thread and callers of register/unregister.
///
/// The epoll token of a source is its raw descriptor, so the dispatch thread
/// can find the callback record straight from the wait report.
#[derive(Debug)]
pub(crate) struct SourceRegistry {
    poll: PollSet,
    sources: Mutex<HashMap<RawFd, Box<dyn EventSource>>>,
}

impl std::fmt::Debug for dyn EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventSource(fd {})", self.fd().as_raw_fd())
    }
}

impl SourceRegistry {
    pub(crate) fn new(poll: PollSet) -> Self {
        Self {
            poll,
            sources: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn poll(&self) -> &PollSet {
        &self.poll
    }

    /// Adds `source` to the watched set.
    ///
    /// Fails if the descriptor is already registered.
    pub(crate) fn register(&self, source: Box<dyn EventSource>) -> Result<(), DisplayError> {
        let raw = source.fd().as_raw_fd();
        let mut sources = self.sources.lock().expect("source table lock");
        match sources.entry(raw) {
            Entry::Occupied(_) => Err(DisplayError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "descriptor already registered",
            ))),
            Entry::Vacant(slot) => {
                self.poll.add(source.fd(), raw as u64)?;
                slot.insert(source);
                Ok(())
            }
        }
    }

    /// Removes the watch for `fd` and drops its source.
    pub(crate) fn unregister(&self, fd: RawFd) -> Result<(), DisplayError> {
        let mut sources = self.sources.lock().expect("source table lock");
        let Some(source) = sources.remove(&fd) else {
            return Err(DisplayError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "descriptor not registered",
            )));
        };
        self.poll.remove(source.fd())?;
        Ok(())
    }

    /// Dispatches the source registered under `token`, if any.
    ///
    /// The source is taken out of the table for the duration of the callback
    /// so the callback may register or unregister other sources. A source
    /// that asks for removal or fails is unregistered and dropped.
    pub(crate) fn dispatch(
        &self,
        token: u64,
        router: &mut EventRouter<'_>,
        readiness: Readiness,
    ) {
        let Ok(raw) = RawFd::try_from(token) else {
            return;
        };
        let Some(mut source) = self.sources.lock().expect("source table lock").remove(&raw)
        else {
            return;
        };
        let keep = match source.ready(router, readiness) {
            Ok(SourceAction::Continue) => true,
            Ok(SourceAction::Remove) => false,
            Err(err) => {
                log::warn!("event source on fd {raw} failed, removing it: {err}");
                false
            }
        };
        if keep {
            self.sources
                .lock()
                .expect("source table lock")
                .insert(raw, source);
        } else if let Err(err) = self.poll.remove(source.fd()) {
            log::warn!("failed to unwatch fd {raw}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsFd;

    fn pipe_pair() -> (OwnedFd, OwnedFd) {
        rustix::pipe::pipe_with(rustix::pipe::PipeFlags::CLOEXEC).expect("pipe")
    }

    #[test]
    fn one_write_reports_one_readable_descriptor() {
        let poll = PollSet::new().expect("epoll");
        let (read_end, write_end) = pipe_pair();
        poll.add(read_end.as_fd(), 7).expect("add");

        rustix::io::write(&write_end, b"x").expect("write");

        let mut ready = Vec::new();
        poll.wait(&mut ready).expect("wait");
        assert_eq!(ready.len(), 1, "exactly one descriptor ready");
        assert_eq!(ready[0].token, 7);
        assert!(ready[0].readiness.readable);
    }

    #[test]
    fn removed_descriptor_is_not_reported() {
        let poll = PollSet::new().expect("epoll");
        let (read_a, write_a) = pipe_pair();
        let (read_b, write_b) = pipe_pair();
        poll.add(read_a.as_fd(), 1).expect("add a");
        poll.add(read_b.as_fd(), 2).expect("add b");
        poll.remove(read_a.as_fd()).expect("remove a");

        rustix::io::write(&write_a, b"x").expect("write a");
        rustix::io::write(&write_b, b"x").expect("write b");

        let mut ready = Vec::new();
        poll.wait(&mut ready).expect("wait");
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].token, 2);
    }

    #[test]
    fn closed_writer_reports_hangup() {
        let poll = PollSet::new().expect("epoll");
        let (read_end, write_end) = pipe_pair();
        poll.add(read_end.as_fd(), 3).expect("add");
        drop(write_end);

        let mut ready = Vec::new();
        poll.wait(&mut ready).expect("wait");
        assert_eq!(ready.len(), 1);
        assert!(ready[0].readiness.hangup);
    }
}
