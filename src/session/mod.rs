//! # Session Module
//!
//! Drives one sensor hub link: reads frames, routes their cargo, sends
//! commands, and keeps the latest readings.
//!
//! ## Receive cycle
//!
//! 1. Read the 4-byte header
//! 2. Stop if the frame has no cargo
//! 3. Read the cargo as the transport dictates ([`CargoRead`])
//! 4. Adopt the inbound sequence number for the channel
//! 5. Segment and decode sensor batches, or check control responses
//!
//! ## Shared state
//!
//! Sequence counters and the reading store sit behind one mutex. The session
//! task is the only writer; any number of [`Reader`] clones may poll the
//! store from other tasks or threads. The lock is never held across I/O.

pub mod store;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tracing::{debug, info, warn};

use crate::error::{BridgeError, Result};
use crate::sh2::batch::segment;
use crate::sh2::command::{encode_product_id_request, encode_set_feature, encode_soft_reset};
use crate::sh2::decoder::decode_record;
use crate::sh2::reading::{Accuracy, ProductId, Quaternion, Reading, StabilityClass, Vector3};
use crate::sh2::report::ReportId;
use crate::shtp::header::Header;
use crate::shtp::protocol::{Channel, SHTP_HEADER_LEN};
use crate::shtp::sequence::SequenceTracker;
use crate::transport::{CargoRead, Transport};

pub use store::{ReadingStore, StoredReading};

/// Default number of receive cycles spent waiting for a Product ID response
pub const DEFAULT_IDENTIFY_ATTEMPTS: u32 = 100;

/// Default pause between receive cycles while waiting for a response
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Mutable state shared between the session and its readers
#[derive(Debug, Default)]
pub struct SessionState {
    pub sequences: SequenceTracker,
    pub store: ReadingStore,
}

impl SessionState {
    /// Route one frame's cargo, returning the number of readings stored
    fn route(&mut self, channel: Channel, cargo: &[u8]) -> usize {
        if channel.carries_sensor_reports() {
            return self.store_batch(cargo);
        }

        match (channel, cargo.first()) {
            (Channel::Control, Some(&id)) if id == u8::from(ReportId::ProductIdResponse) => {
                self.store.mark_response(ReportId::ProductIdResponse);
                if let Some(product_id) = ProductId::parse(cargo) {
                    self.store.set_product_id(product_id);
                }
                debug!("Product ID response received ({} bytes)", cargo.len());
            }
            (_, Some(&id)) => {
                debug!("Ignoring report 0x{:02X} on {:?} channel", id, channel);
            }
            (_, None) => {}
        }
        0
    }

    fn store_batch(&mut self, cargo: &[u8]) -> usize {
        let mut stored = 0;
        for record in segment(cargo) {
            match decode_record(record.report, record.bytes) {
                Ok((reading, accuracy)) => {
                    debug!("Decoded {:?} at offset {}", record.report, record.offset);
                    self.store.update(record.report, reading, accuracy);
                    stored += 1;
                }
                Err(e) => debug!("Skipping record at offset {}: {}", record.offset, e),
            }
        }
        stored
    }
}

/// Cloneable read handle onto a session's readings
#[derive(Debug, Clone, Default)]
pub struct Reader {
    state: Arc<Mutex<SessionState>>,
}

impl Reader {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // State stays consistent even if a holder panicked mid-update
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest reading for `report`
    pub fn reading(&self, report: ReportId) -> Option<Reading> {
        self.lock().store.reading(report)
    }

    /// Latest accuracy for `report` (`Unreliable` until one arrives)
    pub fn accuracy(&self, report: ReportId) -> Accuracy {
        self.lock().store.accuracy(report)
    }

    /// Whether a reading or control response has been seen for `report`
    pub fn contains(&self, report: ReportId) -> bool {
        self.lock().store.contains(report)
    }

    /// Rotation vector orientation
    pub fn quaternion(&self) -> Option<Quaternion> {
        self.quaternion_of(ReportId::RotationVector)
    }

    /// Game rotation vector orientation (no magnetometer)
    pub fn game_quaternion(&self) -> Option<Quaternion> {
        self.quaternion_of(ReportId::GameRotationVector)
    }

    /// Calibrated acceleration in m/s²
    pub fn accelerometer(&self) -> Option<Vector3> {
        self.vector_of(ReportId::Accelerometer)
    }

    /// Calibrated angular velocity in rad/s
    pub fn gyroscope(&self) -> Option<Vector3> {
        self.vector_of(ReportId::Gyroscope)
    }

    /// Calibrated magnetic field in µT
    pub fn magnetometer(&self) -> Option<Vector3> {
        self.vector_of(ReportId::Magnetometer)
    }

    /// Acceleration with gravity removed, in m/s²
    pub fn linear_acceleration(&self) -> Option<Vector3> {
        self.vector_of(ReportId::LinearAcceleration)
    }

    /// Gravity vector in m/s²
    pub fn gravity(&self) -> Option<Vector3> {
        self.vector_of(ReportId::Gravity)
    }

    /// Stability classifier output
    pub fn stability(&self) -> Option<StabilityClass> {
        self.reading(ReportId::StabilityClassifier)
            .and_then(|r| r.as_classifier())
            .map(StabilityClass::from_raw)
    }

    /// Last decoded Product ID response
    pub fn product_id(&self) -> Option<ProductId> {
        self.lock().store.product_id()
    }

    /// Sequence counter currently held for `channel`
    pub fn sequence(&self, channel: Channel) -> u8 {
        self.lock().sequences.current(channel)
    }

    /// Copy of every stored reading
    pub fn snapshot(&self) -> Vec<StoredReading> {
        self.lock().store.snapshot()
    }

    fn quaternion_of(&self, report: ReportId) -> Option<Quaternion> {
        self.reading(report).and_then(|r| r.as_quaternion())
    }

    fn vector_of(&self, report: ReportId) -> Option<Vector3> {
        self.reading(report).and_then(|r| r.as_vector3())
    }
}

/// Tunables for request/response exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Receive cycles to spend waiting for a Product ID response
    pub identify_attempts: u32,

    /// Pause between those cycles
    pub poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            identify_attempts: DEFAULT_IDENTIFY_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Sensor hub session over one transport
///
/// # Examples
///
/// ```no_run
/// use sh2_bridge::session::Session;
/// use sh2_bridge::sh2::report::ReportId;
/// use sh2_bridge::transport::StreamTransport;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut session = Session::new(StreamTransport::open_default()?);
///     session.soft_reset().await?;
///     session.enable_feature(ReportId::RotationVector, 50_000).await?;
///
///     loop {
///         session.process_one().await?;
///         if let Some(q) = session.readings().quaternion() {
///             println!("heading {:.1}", q.to_euler().heading());
///         }
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    reader: Reader,
    options: SessionOptions,
}

impl<T: Transport> Session<T> {
    /// Create a session with default options
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, SessionOptions::default())
    }

    pub fn with_options(transport: T, options: SessionOptions) -> Self {
        Self {
            transport,
            reader: Reader::default(),
            options,
        }
    }

    /// Readings of this session
    pub fn readings(&self) -> &Reader {
        &self.reader
    }

    /// Detached read handle for other tasks or threads
    pub fn reader(&self) -> Reader {
        self.reader.clone()
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one receive cycle
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of readings stored from this frame
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The transport fails or returns a short read
    /// - The header is undersized or names an unknown channel
    ///
    /// Nothing from a failed cycle is committed; the next call starts fresh.
    pub async fn process_one(&mut self) -> Result<usize> {
        let mut header_buf = [0u8; SHTP_HEADER_LEN];
        let n = self
            .transport
            .receive(&mut header_buf)
            .await
            .map_err(BridgeError::Transport)?;
        if n > 0 && n < SHTP_HEADER_LEN {
            return Err(BridgeError::ShortRead {
                expected: SHTP_HEADER_LEN,
                actual: n,
            });
        }
        let header = Header::decode(&header_buf[..n])?;

        if header.is_empty() {
            return Ok(0);
        }

        let (header, cargo) = self.read_cargo(header).await?;
        let channel = Channel::try_from(header.channel)?;

        debug!(
            "SHTP frame: channel {:?}, seq {}, len {}",
            channel, header.sequence, header.length
        );

        let mut state = self.reader.lock();
        state.sequences.observe(channel, header.sequence);
        Ok(state.route(channel, &cargo))
    }

    /// Read the cargo that follows `header`
    async fn read_cargo(&mut self, header: Header) -> Result<(Header, Vec<u8>)> {
        match self.transport.cargo_read() {
            CargoRead::FullFrame => {
                // The read pointer restarted: the header comes again
                let mut frame = vec![0u8; header.length as usize];
                self.receive_exact(&mut frame).await?;
                let reread = Header::decode(&frame)?;
                if reread.length != header.length {
                    warn!(
                        "Frame length changed on re-read: {} -> {}",
                        header.length, reread.length
                    );
                }
                frame.drain(..SHTP_HEADER_LEN);
                Ok((reread, frame))
            }
            CargoRead::Remaining => {
                let mut cargo = vec![0u8; header.cargo_len()];
                self.receive_exact(&mut cargo).await?;
                Ok((header, cargo))
            }
        }
    }

    /// Fill `buf` with the rest of a frame whose header was consumed
    ///
    /// Any failure here leaves the link mid-frame, so it surfaces as a
    /// desync error rather than a plain transport error.
    async fn receive_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let expected = buf.len();
        let n = self
            .transport
            .receive(buf)
            .await
            .map_err(|source| BridgeError::CargoLost { expected, source })?;
        if n < buf.len() {
            return Err(BridgeError::ShortRead {
                expected: buf.len(),
                actual: n,
            });
        }
        Ok(())
    }

    /// Send `payload` on `channel`
    ///
    /// The frame is stamped with the channel's current sequence number, which
    /// advances only if the transport accepts the write.
    ///
    /// # Errors
    ///
    /// Returns error if the payload is too large for one frame or the
    /// transport write fails
    pub async fn send(&mut self, channel: Channel, payload: &[u8]) -> Result<()> {
        let sequence = self.reader.lock().sequences.current(channel);
        let header = Header::for_cargo(channel, sequence, payload.len())?;

        let mut frame = BytesMut::with_capacity(header.length as usize);
        frame.put_slice(&header.encode());
        frame.put_slice(payload);

        self.transport
            .send(&frame)
            .await
            .map_err(BridgeError::Transport)?;

        self.reader.lock().sequences.next(channel);
        debug!(
            "Sent {} bytes on {:?} channel (seq {})",
            payload.len(),
            channel,
            sequence
        );
        Ok(())
    }

    /// Drive receive cycles until `report` shows up in the store
    ///
    /// Errors inside the loop are logged and the next attempt proceeds.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the report arrived within `max_attempts` cycles
    pub async fn await_report(
        &mut self,
        report: ReportId,
        max_attempts: u32,
        poll_interval: Duration,
    ) -> bool {
        for attempt in 1..=max_attempts {
            match self.process_one().await {
                Ok(_) if self.reader.contains(report) => return true,
                Ok(_) => {}
                Err(e) if e.is_desync() => {
                    debug!("Receive attempt {} lost alignment: {}", attempt, e);
                    if let Err(e) = self.resync().await {
                        warn!("Resync failed: {}", e);
                    }
                }
                Err(e) => debug!("Receive attempt {} failed: {}", attempt, e),
            }

            if attempt < max_attempts {
                tokio::time::sleep(poll_interval).await;
            }
        }
        false
    }

    /// Regain frame alignment after a desync error
    ///
    /// Pending input is dropped so the next `process_one` starts on a
    /// header boundary.
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of bytes discarded
    pub async fn resync(&mut self) -> Result<usize> {
        let discarded = self
            .transport
            .discard_input()
            .await
            .map_err(BridgeError::Transport)?;
        info!("Resynchronized link, discarded {} bytes", discarded);
        Ok(discarded)
    }

    /// Request and wait for the Product ID response
    ///
    /// # Returns
    ///
    /// * `Result<Option<ProductId>>` - Decoded identification, or `None` when
    ///   the response was too short to carry it
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Timeout` if no response arrives within the
    /// configured attempts
    pub async fn check_id(&mut self) -> Result<Option<ProductId>> {
        self.reader
            .lock()
            .store
            .clear_response(ReportId::ProductIdResponse);

        self.send(Channel::Control, &encode_product_id_request()).await?;

        let SessionOptions {
            identify_attempts,
            poll_interval,
        } = self.options;
        if !self
            .await_report(ReportId::ProductIdResponse, identify_attempts, poll_interval)
            .await
        {
            return Err(BridgeError::Timeout(format!(
                "No Product ID response after {} attempts",
                identify_attempts
            )));
        }

        let product_id = self.reader.product_id();
        match product_id {
            Some(pid) => info!("Sensor hub identified: {}", pid),
            None => info!("Sensor hub answered Product ID request"),
        }
        Ok(product_id)
    }

    /// Reset the sensor hub
    pub async fn soft_reset(&mut self) -> Result<()> {
        info!("Sending soft reset");
        self.send(Channel::Executable, &encode_soft_reset()).await
    }

    /// Enable periodic reports of `report` every `interval_us` microseconds
    pub async fn enable_feature(&mut self, report: ReportId, interval_us: u32) -> Result<()> {
        info!("Enabling {:?} every {} µs", report, interval_us);
        self.send(Channel::Control, &encode_set_feature(report, interval_us))
            .await
    }

    /// Tear down the transport
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await.map_err(BridgeError::Transport)
    }
}
