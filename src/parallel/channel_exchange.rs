//! In-process [`Exchange`] over `crossbeam-channel`.
//!
//! [`ChannelExchange::group`] wires `n` endpoints with one unbounded channel per ordered
//! pair of ranks. When a worker stops early its endpoint is dropped, and every peer
//! waiting on it gets a [`StormError::Transport`] instead of blocking forever.
use std::cell::RefCell;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::{parallel::Exchange, storm_errors::StormError, tracks::TrackSet};

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: usize,
    tracks: TrackSet,
}

/// One rank of a channel group. Move each endpoint into its own worker thread.
#[derive(Debug)]
pub struct ChannelExchange {
    rank: usize,
    outboxes: Vec<Option<Sender<Envelope>>>,
    inboxes: Vec<Option<Receiver<Envelope>>>,
    // messages received ahead of the matching `recv`
    stash: RefCell<Vec<Envelope>>,
}

impl ChannelExchange {
    /// Build the `size` connected endpoints of a group, indexed by rank.
    pub fn group(size: usize) -> Vec<ChannelExchange> {
        let mut outboxes: Vec<Vec<Option<Sender<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut inboxes: Vec<Vec<Option<Receiver<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for source in 0..size {
            for dest in (0..size).filter(|&d| d != source) {
                let (tx, rx) = unbounded();
                outboxes[source][dest] = Some(tx);
                inboxes[dest][source] = Some(rx);
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| ChannelExchange {
                rank,
                outboxes,
                inboxes,
                stash: RefCell::new(Vec::new()),
            })
            .collect()
    }

    fn peer_error(&self, peer: usize) -> StormError {
        StormError::InvalidArgument(format!(
            "rank {peer} is not a peer of rank {} in a group of {}",
            self.rank,
            self.size()
        ))
    }
}

impl Exchange for ChannelExchange {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, dest: usize, tag: usize, tracks: TrackSet) -> Result<(), StormError> {
        let outbox = self
            .outboxes
            .get(dest)
            .and_then(Option::as_ref)
            .ok_or_else(|| self.peer_error(dest))?;
        outbox
            .send(Envelope {
                source: self.rank,
                tag,
                tracks,
            })
            .map_err(|_| {
                StormError::Transport(format!(
                    "rank {dest} hung up before rank {} sent tag {tag}",
                    self.rank
                ))
            })
    }

    fn recv(&self, source: usize, tag: usize) -> Result<TrackSet, StormError> {
        let inbox = self
            .inboxes
            .get(source)
            .and_then(Option::as_ref)
            .ok_or_else(|| self.peer_error(source))?;

        {
            let mut stash = self.stash.borrow_mut();
            if let Some(pos) = stash
                .iter()
                .position(|e| e.source == source && e.tag == tag)
            {
                return Ok(stash.remove(pos).tracks);
            }
        }

        loop {
            let envelope = inbox.recv().map_err(|_| {
                StormError::Transport(format!(
                    "rank {source} hung up before sending tag {tag} to rank {}",
                    self.rank
                ))
            })?;
            if envelope.tag == tag {
                return Ok(envelope.tracks);
            }
            self.stash.borrow_mut().push(envelope);
        }
    }
}
