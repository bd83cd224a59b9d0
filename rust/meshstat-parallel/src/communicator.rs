//! Blocking point-to-point messaging between ranks.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        mpsc::{self, Receiver, Sender},
    },
};

use meshstat_common::{Result, error::Error};

/// Tag reserved for [`Communicator::broadcast`]. User tags are non-negative.
pub const BROADCAST_TAG: i32 = -1;

/// A group of ranks exchanging byte messages.
///
/// `send` and `receive` block; a message is matched on its source rank and tag,
/// and messages with the same source and tag arrive in the order they were
/// sent. Every failure is a transport error.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn send(&self, buffer: &[u8], destination: usize, tag: i32) -> Result<()>;

    fn receive(&self, source: usize, tag: i32) -> Result<Vec<u8>>;

    /// Distributes `value` from `root` to every rank and returns it. Every rank
    /// must call this; the value passed by non-root ranks is ignored.
    fn broadcast(&self, value: bool, root: usize) -> Result<bool> {
        if self.rank() == root {
            for destination in (0..self.size()).filter(|&r| r != root) {
                self.send(&[value as u8], destination, BROADCAST_TAG)?;
            }
            return Ok(value);
        }
        let payload = self.receive(root, BROADCAST_TAG)?;
        match payload.as_slice() {
            [flag] => Ok(*flag != 0),
            other => Err(Error::transport(
                "broadcast",
                format!("expected 1 byte from rank {root}, got {}", other.len()),
            )),
        }
    }
}

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: i32,
    payload: Vec<u8>,
}

impl Envelope {
    fn matches(&self, source: usize, tag: i32) -> bool {
        self.source == source && self.tag == tag
    }
}

/// One endpoint of a group of ranks connected by in-process channels.
///
/// Each endpoint is meant to be moved onto its own thread. Messages that arrive
/// before they are asked for are parked until a matching `receive`.
#[derive(Debug)]
pub struct LocalCommunicator {
    rank: usize,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    parked: Mutex<VecDeque<Envelope>>,
}

impl LocalCommunicator {
    /// Creates `size` connected endpoints, ordered by rank.
    pub fn group(size: usize) -> Vec<LocalCommunicator> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalCommunicator {
                rank,
                peers: senders.clone(),
                inbox,
                parked: Mutex::new(VecDeque::new()),
            })
            .collect()
    }

    fn check_rank(&self, rank: usize, context: &str) -> Result<()> {
        if rank < self.peers.len() {
            Ok(())
        } else {
            Err(Error::transport(
                context,
                format!("rank {rank} outside group of {}", self.peers.len()),
            ))
        }
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, buffer: &[u8], destination: usize, tag: i32) -> Result<()> {
        self.check_rank(destination, "send")?;
        let envelope = Envelope {
            source: self.rank,
            tag,
            payload: buffer.to_vec(),
        };
        self.peers[destination].send(envelope).map_err(|_| {
            Error::transport("send", format!("rank {destination} is no longer listening"))
        })
    }

    fn receive(&self, source: usize, tag: i32) -> Result<Vec<u8>> {
        self.check_rank(source, "receive")?;
        let mut parked = self
            .parked
            .lock()
            .map_err(|_| Error::transport("receive", "parked message queue poisoned"))?;
        let waiting = parked.iter().position(|e| e.matches(source, tag));
        if let Some(envelope) = waiting.and_then(|index| parked.remove(index)) {
            return Ok(envelope.payload);
        }
        loop {
            let envelope = self.inbox.recv().map_err(|_| {
                Error::transport("receive", format!("channel to rank {} closed", self.rank))
            })?;
            if envelope.matches(source, tag) {
                return Ok(envelope.payload);
            }
            log::trace!(
                "rank {}: parking message from rank {} with tag {}",
                self.rank,
                envelope.source,
                envelope.tag
            );
            parked.push_back(envelope);
        }
    }
}

/// The communicator of a run without peers: rank 0 of a group of one.
///
/// Messages sent to rank 0 are queued and handed back by `receive`; receiving
/// with nothing queued fails instead of blocking forever.
#[derive(Debug, Default)]
pub struct SingleProcess {
    queued: Mutex<VecDeque<(i32, Vec<u8>)>>,
}

impl SingleProcess {
    pub fn new() -> SingleProcess {
        SingleProcess::default()
    }
}

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, buffer: &[u8], destination: usize, tag: i32) -> Result<()> {
        if destination != 0 {
            return Err(Error::transport(
                "send",
                format!("rank {destination} outside group of 1"),
            ));
        }
        self.queued
            .lock()
            .map_err(|_| Error::transport("send", "message queue poisoned"))?
            .push_back((tag, buffer.to_vec()));
        Ok(())
    }

    fn receive(&self, source: usize, tag: i32) -> Result<Vec<u8>> {
        if source != 0 {
            return Err(Error::transport(
                "receive",
                format!("rank {source} outside group of 1"),
            ));
        }
        let mut queued = self
            .queued
            .lock()
            .map_err(|_| Error::transport("receive", "message queue poisoned"))?;
        let index = queued
            .iter()
            .position(|(t, _)| *t == tag)
            .ok_or_else(|| Error::transport("receive", format!("no message with tag {tag}")))?;
        queued
            .remove(index)
            .map(|(_, payload)| payload)
            .ok_or_else(|| Error::transport("receive", "message queue changed underneath"))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use meshstat_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_point_to_point_in_rank_order() {
        let results: Vec<Vec<u8>> = thread::scope(|scope| {
            let handles: Vec<_> = LocalCommunicator::group(3)
                .into_iter()
                .map(|comm| {
                    scope.spawn(move || {
                        if comm.rank() == 0 {
                            let mut received = Vec::new();
                            for source in 1..comm.size() {
                                received.extend(comm.receive(source, 7).unwrap());
                            }
                            received
                        } else {
                            comm.send(&[comm.rank() as u8], 0, 7).unwrap();
                            Vec::new()
                        }
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results[0], vec![1, 2]);
    }

    #[test]
    fn test_out_of_order_tags_are_parked() {
        let mut group = LocalCommunicator::group(2);
        let receiver = group.pop().unwrap();
        let sender = group.pop().unwrap();
        sender.send(b"second", 1, 2).unwrap();
        sender.send(b"first", 1, 1).unwrap();
        assert_eq!(receiver.receive(0, 1).unwrap(), b"first");
        assert_eq!(receiver.receive(0, 2).unwrap(), b"second");
    }

    #[test]
    fn test_broadcast() {
        let flags: Vec<bool> = thread::scope(|scope| {
            let handles: Vec<_> = LocalCommunicator::group(4)
                .into_iter()
                .map(|comm| scope.spawn(move || comm.broadcast(comm.rank() == 0, 0).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(flags, vec![true; 4]);
    }

    #[test]
    fn test_send_to_unknown_rank() {
        let group = LocalCommunicator::group(2);
        let err = group[0].send(b"x", 5, 0).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Transport { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_send_to_dropped_rank() {
        let mut group = LocalCommunicator::group(2);
        drop(group.pop());
        let err = group[0].send(b"x", 1, 0).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Transport { .. }));
    }

    #[test]
    fn test_single_process() {
        let comm = SingleProcess::new();
        assert!(comm.broadcast(true, 0).unwrap());
        comm.send(b"abc", 0, 3).unwrap();
        assert_eq!(comm.receive(0, 3).unwrap(), b"abc");
        assert!(comm.receive(0, 3).is_err());
        assert!(comm.send(b"abc", 1, 3).is_err());
    }
}
