use embedded_hal::blocking::delay::DelayMs;
use heapless::{String, Vec};

use crate::interface::DeviceInterface;

/// Segment codes a receiver must produce before a session is complete.
pub const SUPPORTED_SEGMENTS: [&str; 6] =
    ["GPGSV", "GPRMC", "GPGSA", "GPGGA", "GPGLL", "GPVTG"];

/// Upper bound on one transport read; matches the fixed bus read size.
const READ_CHUNK: usize = 255;
const SESSION_BUF: usize = 1024;
const SEGMENT_CODE_LEN: usize = 8;
const MAX_TRACKED_SEGMENTS: usize = 16;
/// Cooperative yield between unproductive polls.
const POLL_YIELD_MS: u8 = 2;

/// Which segment codes have been seen in the current session.
///
/// A code stays seen for the rest of the session; there is no un-seeing.
#[derive(Debug, Default)]
pub struct SegmentRegistry {
    seen: Vec<String<SEGMENT_CODE_LEN>, MAX_TRACKED_SEGMENTS>,
}

impl SegmentRegistry {
    pub fn new() -> Self {
        Self { seen: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn is_seen(&self, code: &str) -> bool {
        self.seen.iter().any(|s| s.as_str() == code)
    }

    /// Record a code. Returns true only on the first sighting; repeats and
    /// codes that do not fit the registry report false.
    pub fn mark_seen(&mut self, code: &str) -> bool {
        if self.is_seen(code) {
            return false;
        }
        let mut entry = String::new();
        if entry.push_str(code).is_err() {
            return false;
        }
        self.seen.push(entry).is_ok()
    }

    /// True when every required code has been seen.
    pub fn covers(&self, required: &[&str]) -> bool {
        required.iter().all(|code| self.is_seen(code))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// One bounded attempt to collect a complete set of sentence types from the
/// transport.
///
/// Chunks are split on the `$` delimiter; a candidate missing the `*`
/// checksum marker is a truncated stream fragment and is dropped without
/// error. The first sentence of each segment code is appended to the session
/// buffer; later duplicates are ignored, which bounds memory on noisy
/// channels. The session ends as soon as the registry covers the required
/// set, or when the millisecond deadline accumulated across the poll yields
/// expires.
#[derive(Debug, Default)]
pub struct SentenceReader {
    buf: String<SESSION_BUF>,
    registry: SegmentRegistry,
    finished: bool,
}

impl SentenceReader {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            registry: SegmentRegistry::new(),
            finished: false,
        }
    }

    /// Poll the transport until every required segment code has been seen or
    /// the timeout elapses. An empty `required` set returns after the first
    /// read attempt.
    ///
    /// Transport read errors and undecodable chunks are dropped silently; a
    /// session that collected nothing is still a normal completion and the
    /// caller decides what an empty registry means.
    pub fn start<DI, D>(
        &mut self,
        di: &mut DI,
        delay_source: &mut D,
        timeout_secs: u16,
        required: &[&str],
    ) where
        DI: DeviceInterface,
        D: DelayMs<u8>,
    {
        log::debug!("start reading sentence data");
        self.buf.clear();
        self.registry.clear();
        self.finished = false;

        if di.wake().is_err() {
            log::debug!("transport wake failed");
        }

        let deadline_ms = u32::from(timeout_secs).saturating_mul(1000);
        let mut elapsed_ms = 0u32;
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if elapsed_ms >= deadline_ms {
                log::debug!("sentence reader timeout");
                break;
            }

            let count = di.read_chunk(&mut chunk).unwrap_or(0);
            if count > 0 {
                match core::str::from_utf8(&chunk[..count]) {
                    Ok(text) => self.ingest(text),
                    Err(_) => log::debug!("undecodable chunk dropped"),
                }
            }

            if self.registry.covers(required) {
                self.finished = true;
                break;
            }

            delay_source.delay_ms(POLL_YIELD_MS);
            elapsed_ms += u32::from(POLL_YIELD_MS);
        }
    }

    fn ingest(&mut self, text: &str) {
        for fragment in text.split('$') {
            let candidate = fragment.trim_end_matches(|c| c == '\r' || c == '\n');
            if !candidate.contains('*') {
                continue;
            }
            let code = candidate.split(',').next().unwrap_or("");
            if code.is_empty() {
                continue;
            }
            if self.registry.mark_seen(code) {
                log::debug!("segment {} found", code);
                if self.buf.push('$').is_err() || self.buf.push_str(candidate).is_err()
                {
                    log::debug!("session buffer full, segment {} dropped", code);
                }
            }
        }
    }

    /// The concatenated first-seen sentences collected this session.
    pub fn data(&self) -> &str {
        &self.buf
    }

    pub fn registry(&self) -> &SegmentRegistry {
        &self.registry
    }

    /// True when the session ended by coverage rather than timeout.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    /// Replays a fixed script of chunks, one per poll.
    struct ScriptedInterface<'a> {
        chunks: &'a [&'a [u8]],
        cursor: usize,
        wakes: usize,
    }

    impl<'a> ScriptedInterface<'a> {
        fn new(chunks: &'a [&'a [u8]]) -> Self {
            Self {
                chunks,
                cursor: 0,
                wakes: 0,
            }
        }
    }

    impl DeviceInterface for ScriptedInterface<'_> {
        type InterfaceError = Error<()>;

        fn wake(&mut self) -> Result<(), Self::InterfaceError> {
            self.wakes += 1;
            Ok(())
        }

        fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Self::InterfaceError> {
            if self.cursor >= self.chunks.len() {
                return Ok(0);
            }
            let chunk = self.chunks[self.cursor];
            self.cursor += 1;
            let count = chunk.len().min(buf.len());
            buf[..count].copy_from_slice(&chunk[..count]);
            Ok(count)
        }
    }

    /// Always fails; the session must shrug it off.
    struct BrokenInterface;

    impl DeviceInterface for BrokenInterface {
        type InterfaceError = Error<()>;

        fn read_chunk(&mut self, _buf: &mut [u8]) -> Result<usize, Self::InterfaceError> {
            Err(Error::Comm(()))
        }
    }

    /// Counts yields instead of sleeping.
    struct CountingDelay {
        slept_ms: u32,
    }

    impl CountingDelay {
        fn new() -> Self {
            Self { slept_ms: 0 }
        }
    }

    impl DelayMs<u8> for CountingDelay {
        fn delay_ms(&mut self, ms: u8) {
            self.slept_ms += u32::from(ms);
        }
    }

    const RMC: &str =
        "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
    const VTG: &str = "$GPVTG,084.4,T,077.8,M,022.4,N,041.5,K*4A";

    #[test]
    fn registry_first_sighting_wins() {
        let mut registry = SegmentRegistry::new();
        assert!(registry.mark_seen("GPRMC"));
        assert!(!registry.mark_seen("GPRMC"));
        assert!(registry.is_seen("GPRMC"));
        assert_eq!(registry.len(), 1);
        assert!(registry.covers(&["GPRMC"]));
        assert!(!registry.covers(&["GPRMC", "GPVTG"]));
        assert!(registry.covers(&[]));
    }

    #[test]
    fn collects_required_segments_and_stops_early() {
        let script: &[&[u8]] = &[b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n$GPVTG,084.4,T,077.8,M,022.4,N,041.5,K*4A\r\n"];
        let mut di = ScriptedInterface::new(script);
        let mut delay = CountingDelay::new();
        let mut session = SentenceReader::new();
        session.start(&mut di, &mut delay, 5, &["GPRMC", "GPVTG"]);

        assert!(session.is_finished());
        assert_eq!(session.registry().len(), 2);
        // buffer holds both sentences, delimiters restored, line endings gone
        let mut expect = heapless::String::<256>::new();
        expect.push_str(RMC).unwrap();
        expect.push_str(VTG).unwrap();
        assert_eq!(session.data(), expect.as_str());
        // completion on the first productive poll, no yield needed
        assert_eq!(delay.slept_ms, 0);
        assert_eq!(di.wakes, 1);
    }

    #[test]
    fn duplicate_segment_types_are_dropped() {
        let first = b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";
        let second = b"$GPRMC,235959,A,5530.000,S,03730.000,E,010.0,180.0,311299,,*0C\r\n";
        let script: &[&[u8]] = &[first, second];
        let mut di = ScriptedInterface::new(script);
        let mut delay = CountingDelay::new();
        let mut session = SentenceReader::new();
        session.start(&mut di, &mut delay, 5, &["GPRMC", "GPVTG"]);

        // only the first GPRMC reaches the buffer
        assert_eq!(session.data(), RMC);
        assert!(!session.is_finished());
    }

    #[test]
    fn fragments_without_checksum_marker_are_dropped() {
        let script: &[&[u8]] = &[b"noise$GPGGA,123519,4807.0$GPVTG,084.4,T,077.8,M,022.4,N,041.5,K*4A\r\n"];
        let mut di = ScriptedInterface::new(script);
        let mut delay = CountingDelay::new();
        let mut session = SentenceReader::new();
        session.start(&mut di, &mut delay, 1, &["GPVTG"]);

        assert_eq!(session.data(), VTG);
        assert!(!session.registry().is_seen("GPGGA"));
    }

    #[test]
    fn undecodable_chunk_is_dropped_silently() {
        let script: &[&[u8]] = &[&[0xff, 0xfe, 0x24, 0x80], VTG.as_bytes()];
        let mut di = ScriptedInterface::new(script);
        let mut delay = CountingDelay::new();
        let mut session = SentenceReader::new();
        session.start(&mut di, &mut delay, 5, &["GPVTG"]);

        assert_eq!(session.data(), VTG);
        assert!(session.is_finished());
    }

    #[test]
    fn timeout_bounds_an_incomplete_session() {
        let mut di = ScriptedInterface::new(&[]);
        let mut delay = CountingDelay::new();
        let mut session = SentenceReader::new();
        session.start(&mut di, &mut delay, 2, &["GPRMC"]);

        assert!(!session.is_finished());
        assert!(session.registry().is_empty());
        assert_eq!(session.data(), "");
        // the cooperative yields account for exactly the configured timeout
        assert_eq!(delay.slept_ms, 2000);
    }

    #[test]
    fn transport_errors_do_not_abort_the_session() {
        let mut di = BrokenInterface;
        let mut delay = CountingDelay::new();
        let mut session = SentenceReader::new();
        session.start(&mut di, &mut delay, 1, &["GPRMC"]);

        assert!(!session.is_finished());
        assert_eq!(delay.slept_ms, 1000);
    }

    #[test]
    fn empty_required_set_returns_after_first_read() {
        let script: &[&[u8]] = &[VTG.as_bytes(), RMC.as_bytes()];
        let mut di = ScriptedInterface::new(script);
        let mut delay = CountingDelay::new();
        let mut session = SentenceReader::new();
        session.start(&mut di, &mut delay, 5, &[]);

        assert!(session.is_finished());
        assert_eq!(di.cursor, 1);
        assert_eq!(session.data(), VTG);
    }
}
