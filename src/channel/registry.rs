//! # Live Channel Registry
//!
//! The one genuinely mutable process-wide object besides the status
//! socket (§9): the set of live channels, behind a reader-writer lock so
//! every status-thread poll and every demodulator thread's self-lookup
//! can proceed concurrently with only occasional writers (channel
//! create/teardown).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::Channel;

#[derive(Default)]
pub struct Registry {
    channels: RwLock<HashMap<u32, Arc<Channel>>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub async fn insert(&self, channel: Arc<Channel>) {
        self.channels.write().await.insert(channel.ssrc(), channel);
    }

    pub async fn remove(&self, ssrc: u32) -> Option<Arc<Channel>> {
        self.channels.write().await.remove(&ssrc)
    }

    pub async fn get(&self, ssrc: u32) -> Option<Arc<Channel>> {
        self.channels.read().await.get(&ssrc).cloned()
    }

    /// Every live channel, sorted by SSRC — the order client-facing
    /// enumeration responses and discovery listings present them in.
    pub async fn enumerate_sorted(&self) -> Vec<Arc<Channel>> {
        let guard = self.channels.read().await;
        let mut all: Vec<Arc<Channel>> = guard.values().cloned().collect();
        all.sort_by_key(|c| c.ssrc());
        all
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }
}

/// Deduplicates a stream of discovery responses by SSRC, keeping the
/// first seen, then sorts by SSRC — the shape a discovering client
/// assembles after collecting replies within its silence/cap window.
pub fn dedupe_and_sort(mut ssrcs: Vec<u32>) -> Vec<u32> {
    ssrcs.sort_unstable();
    ssrcs.dedup();
    ssrcs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::demod::DemodState;
    use crate::tlv::DemodTypeTag;

    #[tokio::test]
    async fn enumerate_is_sorted_by_ssrc() {
        let registry = Registry::new();
        for ssrc in [0x10, 0x1, 0x2] {
            registry
                .insert(Arc::new(Channel::new(ssrc, DemodState::new(DemodTypeTag::Fm))))
                .await;
        }
        let ssrcs: Vec<u32> = registry
            .enumerate_sorted()
            .await
            .iter()
            .map(|c| c.ssrc())
            .collect();
        assert_eq!(ssrcs, vec![0x1, 0x2, 0x10]);
    }

    #[tokio::test]
    async fn remove_then_get_is_none() {
        let registry = Registry::new();
        registry
            .insert(Arc::new(Channel::new(7, DemodState::new(DemodTypeTag::Linear))))
            .await;
        assert!(registry.get(7).await.is_some());
        registry.remove(7).await;
        assert!(registry.get(7).await.is_none());
    }

    #[test]
    fn dedupe_and_sort_drops_repeats() {
        assert_eq!(dedupe_and_sort(vec![2, 1, 2, 1, 3]), vec![1, 2, 3]);
    }
}
