//! The UDP node: sockets, software clock, and the event loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::BytesMut;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::clock::OrdinaryClock;
use crate::error::PtpError;
use crate::hal::{AdjustMode, PortHal};
use crate::messages::{Header, MessageType};
use crate::time::{TimeInterval, Timestamp};
use crate::types::{ClockIdentity, ClockQuality, PtpConfig};

/// Configuration for a [`UdpPtpNode`].
#[derive(Debug, Clone)]
pub struct UdpPtpNodeConfig {
    /// Local address for the event socket (port 319, or 0 in tests).
    pub event_bind: SocketAddr,
    /// Local address for the general socket (port 320, or 0 in tests).
    pub general_bind: SocketAddr,
    /// Destination for event messages (peer or multicast group).
    pub event_dest: SocketAddr,
    /// Destination for general messages.
    pub general_dest: SocketAddr,
    /// Receive buffer size per datagram.
    pub recv_buf_size: usize,
    /// How often the engine's `tick` runs.
    pub tick_interval: Duration,
}

impl Default for UdpPtpNodeConfig {
    fn default() -> Self {
        Self {
            event_bind: SocketAddr::from(([0, 0, 0, 0], super::PTP_EVENT_PORT)),
            general_bind: SocketAddr::from(([0, 0, 0, 0], super::PTP_GENERAL_PORT)),
            event_dest: SocketAddr::from((super::PTP_PRIMARY_MULTICAST, super::PTP_EVENT_PORT)),
            general_dest: SocketAddr::from((super::PTP_PRIMARY_MULTICAST, super::PTP_GENERAL_PORT)),
            recv_buf_size: 256,
            tick_interval: Duration::from_millis(50),
        }
    }
}

/// [`PortHal`] over a pair of UDP sockets with a software-disciplined
/// clock.
///
/// Sends are non-blocking (`try_send_to`); a socket that cannot accept
/// a datagram immediately reports [`PtpError::Timeout`]. Clock
/// corrections are applied to a local phase offset added onto the
/// system clock read, the usual arrangement when no adjustable
/// hardware clock is available.
pub struct UdpHal {
    event_socket: Arc<UdpSocket>,
    general_socket: Arc<UdpSocket>,
    event_dest: SocketAddr,
    general_dest: SocketAddr,
    /// Accumulated phase correction applied to clock reads.
    phase_correction: TimeInterval,
    /// Last commanded frequency adjustment, for observability only.
    frequency_ppb: f64,
}

impl UdpHal {
    fn new(
        event_socket: Arc<UdpSocket>,
        general_socket: Arc<UdpSocket>,
        event_dest: SocketAddr,
        general_dest: SocketAddr,
    ) -> Self {
        Self {
            event_socket,
            general_socket,
            event_dest,
            general_dest,
            phase_correction: TimeInterval::ZERO,
            frequency_ppb: 0.0,
        }
    }

    /// The current software clock: system time plus the accumulated
    /// phase correction.
    #[must_use]
    pub fn clock_now(&self) -> Timestamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Timestamp::new(since_epoch.as_secs(), since_epoch.subsec_nanos()) + self.phase_correction
    }

    /// Last commanded frequency adjustment.
    #[must_use]
    pub const fn frequency_ppb(&self) -> f64 {
        self.frequency_ppb
    }

    /// Retarget both destinations to a discovered peer.
    pub fn set_peer(&mut self, event_dest: SocketAddr, general_dest: SocketAddr) {
        self.event_dest = event_dest;
        self.general_dest = general_dest;
    }

    fn try_send(socket: &UdpSocket, frame: &[u8], dest: SocketAddr) -> Result<(), PtpError> {
        match socket.try_send_to(frame, dest) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(PtpError::Timeout),
            Err(e) => {
                debug!(error = %e, %dest, "UDP send failed");
                Err(PtpError::Timeout)
            }
        }
    }
}

impl PortHal for UdpHal {
    fn send_announce(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        Self::try_send(&self.general_socket, frame, self.general_dest)?;
        Ok(None)
    }

    fn send_sync(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        Self::try_send(&self.event_socket, frame, self.event_dest)?;
        // Software timestamping: read the clock right after the send.
        Ok(Some(self.clock_now()))
    }

    fn send_follow_up(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        Self::try_send(&self.general_socket, frame, self.general_dest)?;
        Ok(None)
    }

    fn send_delay_req(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        Self::try_send(&self.event_socket, frame, self.event_dest)?;
        Ok(Some(self.clock_now()))
    }

    fn send_delay_resp(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        Self::try_send(&self.general_socket, frame, self.general_dest)?;
        Ok(None)
    }

    fn timestamp(&mut self) -> Timestamp {
        self.clock_now()
    }

    fn adjust_clock(&mut self, offset: TimeInterval, _mode: AdjustMode) -> Result<(), PtpError> {
        // Remove the measured offset from subsequent clock reads.
        self.phase_correction = self.phase_correction.saturating_sub(offset);
        info!(%offset, "software clock stepped");
        Ok(())
    }

    fn adjust_frequency(&mut self, ppb: f64) -> Result<(), PtpError> {
        self.frequency_ppb = ppb;
        Ok(())
    }
}

/// An ordinary clock bound to UDP sockets with a tokio event loop.
pub struct UdpPtpNode {
    clock: OrdinaryClock<UdpHal>,
    event_socket: Arc<UdpSocket>,
    general_socket: Arc<UdpSocket>,
    config: UdpPtpNodeConfig,
}

impl UdpPtpNode {
    /// Bind the sockets and construct the engine.
    ///
    /// # Errors
    /// Socket bind failures.
    pub async fn bind(
        identity: ClockIdentity,
        quality: ClockQuality,
        ptp_config: PtpConfig,
        config: UdpPtpNodeConfig,
    ) -> std::io::Result<Self> {
        let event_socket = Arc::new(UdpSocket::bind(config.event_bind).await?);
        let general_socket = Arc::new(UdpSocket::bind(config.general_bind).await?);
        let hal = UdpHal::new(
            Arc::clone(&event_socket),
            Arc::clone(&general_socket),
            config.event_dest,
            config.general_dest,
        );
        let mut clock = OrdinaryClock::new(identity, quality, ptp_config, hal);
        clock.start(clock_read());
        Ok(Self {
            clock,
            event_socket,
            general_socket,
            config,
        })
    }

    /// Local address of the event socket (useful with ephemeral ports).
    ///
    /// # Errors
    /// Propagates `local_addr` failures.
    pub fn event_addr(&self) -> std::io::Result<SocketAddr> {
        self.event_socket.local_addr()
    }

    /// Local address of the general socket.
    ///
    /// # Errors
    /// Propagates `local_addr` failures.
    pub fn general_addr(&self) -> std::io::Result<SocketAddr> {
        self.general_socket.local_addr()
    }

    /// The engine.
    #[must_use]
    pub const fn clock(&self) -> &OrdinaryClock<UdpHal> {
        &self.clock
    }

    /// Mutable engine access (admin control, peer targeting).
    pub fn clock_mut(&mut self) -> &mut OrdinaryClock<UdpHal> {
        &mut self.clock
    }

    /// Run the event loop until `shutdown` flips to true.
    ///
    /// All engine entry points are invoked from this loop only, which
    /// provides the serialization the engine requires.
    ///
    /// # Errors
    /// Non-transient socket errors.
    pub async fn run(
        &mut self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let mut event_buf = BytesMut::zeroed(self.config.recv_buf_size);
        let mut general_buf = BytesMut::zeroed(self.config.recv_buf_size);
        let mut ticker = tokio::time::interval(self.config.tick_interval);

        loop {
            tokio::select! {
                result = self.event_socket.recv_from(&mut event_buf[..]) => {
                    match result {
                        Ok((len, src)) => self.deliver(&event_buf[..len], src),
                        Err(e) if is_transient_udp_error(&e) => {
                            debug!(error = %e, "transient event socket error");
                        }
                        Err(e) => return Err(e),
                    }
                }

                result = self.general_socket.recv_from(&mut general_buf[..]) => {
                    match result {
                        Ok((len, src)) => self.deliver(&general_buf[..len], src),
                        Err(e) if is_transient_udp_error(&e) => {
                            debug!(error = %e, "transient general socket error");
                        }
                        Err(e) => return Err(e),
                    }
                }

                _ = ticker.tick() => {
                    self.clock.tick(clock_read());
                }

                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("PTP node shutting down");
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn deliver(&mut self, data: &[u8], src: SocketAddr) {
        let rx = clock_read();
        // Learn the peer's ports from its traffic so replies reach an
        // ephemeral-port peer (tests, non-standard setups).
        if let Ok(header) = Header::decode(data) {
            if header.message_type.is_event() {
                let general = SocketAddr::new(src.ip(), guess_general_port(src));
                self.clock
                    .port_mut()
                    .hal_mut()
                    .set_peer(src, general);
            }
            if header.message_type == MessageType::Announce {
                debug!(%src, seq = header.sequence_id, "announce received");
            }
        } else {
            warn!(%src, len = data.len(), "undecodable datagram");
        }
        self.clock.process_message(data, rx);
    }
}

/// The general port corresponding to an observed event source: the
/// standard port when the peer uses it, the same port otherwise.
fn guess_general_port(event_src: SocketAddr) -> u16 {
    if event_src.port() == super::PTP_EVENT_PORT {
        super::PTP_GENERAL_PORT
    } else {
        event_src.port()
    }
}

/// System clock as a PTP timestamp.
fn clock_read() -> Timestamp {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    Timestamp::new(since_epoch.as_secs(), since_epoch.subsec_nanos())
}

/// Whether a UDP error is benign and should be retried.
///
/// On Windows, `WSAECONNRESET` (10054) surfaces on `recv_from` after a
/// previous send hit an ICMP "port unreachable"; the peer may simply
/// not be listening yet.
fn is_transient_udp_error(e: &std::io::Error) -> bool {
    if e.raw_os_error() == Some(10054) {
        return true;
    }
    e.kind() == std::io::ErrorKind::ConnectionReset
}
