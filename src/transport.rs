//! # Status/Command Transport
//!
//! UDP multicast request/response discipline layered over the wire
//! codec: the status socket blocks on receive with a short timeout,
//! sends are non-blocking and best-effort, and discovery polls are
//! collected within a silence window with a hard cap.

use std::net::SocketAddr;
use std::time::Duration;

use rand::Rng;
use socket2::{Domain, Protocol, Socket as Socket2, Type};
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};

use crate::constants::{DISCOVERY_CAP_MS, DISCOVERY_SILENCE_MS, STATUS_RECV_TIMEOUT_MS};
use crate::error::RadioError;

/// A bound, multicast-joined UDP socket for the status/command protocol.
pub struct StatusSocket {
    socket: UdpSocket,
}

impl StatusSocket {
    /// Binds `bind_addr`, joins `multicast_group` on the interface
    /// reachable via `bind_addr`'s address, and puts the socket in
    /// non-blocking mode so sends never stall the demodulator or status
    /// thread on a full kernel buffer.
    pub fn bind_multicast(bind_addr: SocketAddr, multicast_group: std::net::Ipv4Addr) -> Result<Self, RadioError> {
        let domain = if bind_addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
        let raw = Socket2::new(domain, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| RadioError::Setup(format!("socket(): {e}")))?;
        raw.set_reuse_address(true)
            .map_err(|e| RadioError::Setup(format!("SO_REUSEADDR: {e}")))?;
        raw.set_nonblocking(true)
            .map_err(|e| RadioError::Setup(format!("O_NONBLOCK: {e}")))?;
        raw.bind(&bind_addr.into())
            .map_err(|e| RadioError::Setup(format!("bind({bind_addr}): {e}")))?;
        if let std::net::IpAddr::V4(local) = bind_addr.ip() {
            raw.join_multicast_v4(&multicast_group, &local)
                .map_err(|e| RadioError::Setup(format!("IP_ADD_MEMBERSHIP: {e}")))?;
        }

        let std_socket: std::net::UdpSocket = raw.into();
        let socket = UdpSocket::from_std(std_socket)
            .map_err(|e| RadioError::Setup(format!("tokio UdpSocket::from_std: {e}")))?;
        Ok(StatusSocket { socket })
    }

    /// Blocks for up to [`STATUS_RECV_TIMEOUT_MS`] for one datagram. `Ok(None)`
    /// on timeout (the normal, frequent case — this is the status thread's
    /// pacing point).
    pub async fn recv(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, RadioError> {
        match time::timeout(Duration::from_millis(STATUS_RECV_TIMEOUT_MS), self.socket.recv_from(buf)).await {
            Ok(Ok((n, from))) => Ok(Some((n, from))),
            Ok(Err(e)) => Err(RadioError::Socket(e)),
            Err(_elapsed) => Ok(None),
        }
    }

    /// Best-effort send: `WouldBlock` is swallowed since status delivery
    /// is idempotent and a future poll will elicit a fresh response.
    pub async fn send_to(&self, buf: &[u8], dest: SocketAddr) {
        match self.socket.send_to(buf, dest).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                log::debug!("status send would block; dropped ({} bytes to {dest})", buf.len());
            }
            Err(e) => {
                log::warn!("status send to {dest} failed: {e}");
            }
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

/// Randomizes a poll interval by ± half of `base`, matching the
/// IGMP-style jitter used to avoid synchronized poll storms across many
/// clients.
pub fn jittered_poll_interval(base: Duration) -> Duration {
    let half = base.as_secs_f64() / 2.0;
    let delta = rand::thread_rng().gen_range(-half..=half);
    Duration::from_secs_f64((base.as_secs_f64() + delta).max(0.0))
}

/// One discovered channel's response arrival.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryHit {
    pub ssrc: u32,
    pub arrived_at: Instant,
}

/// Collects discovery responses until `silence` has elapsed with no new
/// hit, or `cap` total time has elapsed, whichever comes first. Dedupes
/// by SSRC (first-seen kept) and returns them sorted.
pub struct DiscoveryCollector {
    deadline: Instant,
    silence: Duration,
    last_hit: Instant,
    seen: std::collections::BTreeSet<u32>,
}

impl DiscoveryCollector {
    pub fn new() -> Self {
        let now = Instant::now();
        DiscoveryCollector {
            deadline: now + Duration::from_millis(DISCOVERY_CAP_MS),
            silence: Duration::from_millis(DISCOVERY_SILENCE_MS),
            last_hit: now,
            seen: std::collections::BTreeSet::new(),
        }
    }

    /// Records a response's SSRC. Returns `true` if collection should
    /// keep waiting for more.
    pub fn record(&mut self, ssrc: u32) -> bool {
        self.seen.insert(ssrc);
        self.last_hit = Instant::now();
        self.still_collecting()
    }

    pub fn still_collecting(&self) -> bool {
        let now = Instant::now();
        now < self.deadline && now.duration_since(self.last_hit) < self.silence
    }

    /// Time remaining until either the silence window or the hard cap
    /// would elapse, whichever is sooner — the value a caller should
    /// pass to its next `recv` timeout.
    pub fn next_wait(&self) -> Duration {
        let now = Instant::now();
        let until_cap = self.deadline.saturating_duration_since(now);
        let until_silence = (self.last_hit + self.silence).saturating_duration_since(now);
        until_cap.min(until_silence)
    }

    pub fn into_sorted_ssrcs(self) -> Vec<u32> {
        self.seen.into_iter().collect()
    }
}

impl Default for DiscoveryCollector {
    fn default() -> Self {
        Self::new()
    }
}
