use chrono::{DateTime, TimeDelta, Utc};
use ntp_proto::protocol::{self, ConstPackedSizeBytes, FromBytes, ShortFormat, TimestampFormat, ToBytes};
use ntp_proto::unix_time::{self, Instant};
use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::adapters::dialer::Dial;
use crate::domain::ntp::{LeapIndicator, Response, ascii_code};
use crate::error::ProbeError;

/// Default deadline for one request/response exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_STRATUM: u8 = 15;
const MAX_DISPERSION: Duration = Duration::from_secs(16);

/// Size of a bare NTPv4 header, without extension fields or MAC.
pub const HEADER_LEN: usize = protocol::Packet::PACKED_SIZE_BYTES;

/// One-shot NTP query that obtains its transport from a [`Dial`] implementation.
pub trait NtpQuery {
    fn query<D: Dial>(
        &self,
        target: &str,
        dialer: &D,
    ) -> impl Future<Output = Result<Response, ProbeError>>;
}

/// SNTPv4 client performing a single exchange per query.
#[derive(Clone, Debug)]
pub struct SntpClient {
    local_address: Option<String>,
    timeout: Duration,
}

impl Default for SntpClient {
    fn default() -> Self {
        Self {
            local_address: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SntpClient {
    pub fn new(local_address: Option<String>, timeout: Duration) -> Self {
        Self {
            local_address,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl NtpQuery for SntpClient {
    async fn query<D: Dial>(&self, target: &str, dialer: &D) -> Result<Response, ProbeError> {
        let local = self.local_address.as_deref().unwrap_or("");
        let socket = dialer.dial(local, target).await?;

        let t1 = Utc::now();
        let xmit = wire_timestamp(t1);
        let request = encode_request(xmit)?;

        let mut buf = [0u8; 1024];
        let exchange = async {
            socket.send(&request).await?;
            let n = socket.recv(&mut buf).await?;
            Ok::<_, std::io::Error>(n)
        };
        let len = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ProbeError::Protocol(format!("timeout after {:?}", self.timeout)))?
            .map_err(|e| ProbeError::Protocol(format!("exchange failed: {e}")))?;
        let t4 = Utc::now();
        drop(socket);

        let reply = decode_reply(&buf[..len])?;
        debug!(
            server = target,
            stratum = reply.stratum.0,
            mode = ?reply.mode,
            "received response"
        );
        let response = parse_response(&reply, xmit, t1, t4)?;
        validate(&response)?;
        Ok(response)
    }
}

/// Client request (LI 0, VN 4, mode 3) carrying `xmit` as its transmit time.
pub fn encode_request(xmit: TimestampFormat) -> Result<[u8; HEADER_LEN], ProbeError> {
    let packet = protocol::Packet {
        transmit_timestamp: xmit,
        ..protocol::Packet::default()
    };
    let mut buf = [0u8; HEADER_LEN];
    packet
        .to_bytes(&mut buf)
        .map_err(|e| ProbeError::Protocol(format!("cannot encode request: {e}")))?;
    Ok(buf)
}

/// Decode the fixed header of a reply; extension fields and MAC are ignored.
pub fn decode_reply(datagram: &[u8]) -> Result<protocol::Packet, ProbeError> {
    protocol::Packet::from_bytes(datagram)
        .map(|(packet, _)| packet)
        .map_err(|e| ProbeError::Protocol(format!("malformed response: {e}")))
}

/// NTP timestamp of a wall clock instant.
pub fn wire_timestamp(t: DateTime<Utc>) -> TimestampFormat {
    Instant::new(t.timestamp(), t.timestamp_subsec_nanos() as i32).into()
}

/// Wall clock time of a server timestamp, taking the NTP era closest to
/// `pivot`. Zero means "unset" and maps to the Unix epoch.
fn wall_clock(ts: TimestampFormat, pivot: &Instant) -> DateTime<Utc> {
    if ts.seconds == 0 && ts.fraction == 0 {
        return DateTime::<Utc>::UNIX_EPOCH;
    }
    let instant = unix_time::timestamp_to_instant(ts, pivot);
    DateTime::from_timestamp(instant.secs(), 0)
        .and_then(|d| d.checked_add_signed(TimeDelta::nanoseconds(instant.subsec_nanos() as i64)))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn short_duration(v: ShortFormat) -> Duration {
    Duration::from_secs(v.seconds as u64)
        + Duration::from_nanos((v.fraction as u64 * 1_000_000_000) >> 16)
}

/// `2^exp` seconds. Exponents past the range of `Duration` come from broken
/// or hostile servers and fail the query.
fn log2_duration(field: &str, exp: i8) -> Result<Duration, ProbeError> {
    Duration::try_from_secs_f64(2f64.powi(exp as i32))
        .map_err(|_| ProbeError::Protocol(format!("{field} out of range: 2^{exp} s")))
}

fn non_negative(delta: TimeDelta) -> Duration {
    delta.to_std().unwrap_or(Duration::ZERO)
}

/// Check a reply against the request it answers and derive the metrics.
///
/// T1 and T4 are the local send and receive times; T2 and T3 come from the
/// server.
pub fn parse_response(
    reply: &protocol::Packet,
    xmit: TimestampFormat,
    t1: DateTime<Utc>,
    t4: DateTime<Utc>,
) -> Result<Response, ProbeError> {
    if reply.mode != protocol::Mode::Server {
        return Err(ProbeError::Protocol(format!(
            "invalid mode in response: {:?}",
            reply.mode
        )));
    }
    if reply.origin_timestamp != xmit {
        return Err(ProbeError::Protocol(
            "server response mismatch: origin timestamp differs from request".into(),
        ));
    }
    let unset = |ts: &TimestampFormat| ts.seconds == 0 && ts.fraction == 0;
    if unset(&reply.transmit_timestamp) {
        return Err(ProbeError::Protocol("server transmit timestamp is zero".into()));
    }
    if unset(&reply.receive_timestamp) {
        return Err(ProbeError::Protocol("server receive timestamp is zero".into()));
    }

    let pivot = Instant::new(t4.timestamp(), t4.timestamp_subsec_nanos() as i32);
    let t2 = wall_clock(reply.receive_timestamp, &pivot);
    let t3 = wall_clock(reply.transmit_timestamp, &pivot);

    let rtt = non_negative((t4 - t1) - (t3 - t2));
    let clock_offset = ((t2 - t1) + (t3 - t4)) / 2;
    let min_error = non_negative((t1 - t2).max(t4 - t3));

    let root_delay = short_duration(reply.root_delay);
    let root_dispersion = short_duration(reply.root_dispersion);
    let root_distance = (rtt + root_delay) / 2 + root_dispersion;

    let stratum = reply.stratum.0;
    let reference_bytes = reply.reference_id.as_bytes();
    let kiss_code = (stratum == 0).then(|| ascii_code(&reference_bytes));

    Ok(Response {
        time: t3,
        rtt,
        clock_offset,
        precision: log2_duration("precision", reply.precision)?,
        stratum,
        reference_id: u32::from_be_bytes(reference_bytes),
        reference_time: wall_clock(reply.reference_timestamp, &pivot),
        root_delay,
        root_dispersion,
        root_distance,
        leap: LeapIndicator::from_bits(reply.leap_indicator as u8),
        poll: log2_duration("poll", reply.poll)?,
        min_error,
        kiss_code,
    })
}

/// Reject responses that must not be used for time keeping.
pub fn validate(r: &Response) -> Result<(), ProbeError> {
    if let Some(code) = &r.kiss_code {
        return Err(ProbeError::Protocol(format!("kiss of death received: {code}")));
    }
    if r.stratum > MAX_STRATUM {
        return Err(ProbeError::Protocol(format!(
            "invalid stratum in response: {}",
            r.stratum
        )));
    }
    if r.leap == LeapIndicator::NotInSync {
        return Err(ProbeError::Protocol("server reports unsynchronized clock".into()));
    }
    if r.root_distance > MAX_DISPERSION {
        return Err(ProbeError::Protocol(format!(
            "invalid dispersion: root distance {:?}",
            r.root_distance
        )));
    }
    if r.reference_time > r.time {
        return Err(ProbeError::Protocol("invalid time reported".into()));
    }
    Ok(())
}
