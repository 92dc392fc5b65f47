use crate::types::HitResult;
use std::io::{self, ErrorKind, Read, Write};

// Each result is one length-framed record: a u32 little-endian payload
// length followed by the serde_json payload. Append-only, no seeking, and
// every field round-trips losslessly.

pub struct RecordWriter<W: Write> {
    sink: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write(&mut self, hit: &HitResult) -> io::Result<()> {
        let payload = serde_json::to_vec(hit)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "record too large"))?;

        self.sink.write_all(&len.to_le_bytes())?;
        self.sink.write_all(&payload)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

pub struct RecordReader<R: Read> {
    source: R,
}

impl<R: Read> RecordReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Reads the next record; `None` at a clean end of stream. A stream cut
    /// off mid-record is an error.
    pub fn read(&mut self) -> io::Result<Option<HitResult>> {
        let mut len_bytes = [0u8; 4];
        match self.source.read_exact(&mut len_bytes) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err),
        }

        let mut payload = vec![0u8; u32::from_le_bytes(len_bytes) as usize];
        self.source.read_exact(&mut payload)?;

        let hit = serde_json::from_slice(&payload)?;
        Ok(Some(hit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn records_round_trip_losslessly() {
        let mut hit = HitResult::new(Utc::now());
        hit.latency = Duration::from_millis(42);
        hit.bytes_in = 4096;
        hit.status_code = 404;
        hit.error = Some("404 Not Found".to_string());
        hit.profile_missing = true;

        let mut buf = Vec::new();
        let mut writer = RecordWriter::new(&mut buf);
        writer.write(&hit).unwrap();
        writer.write(&HitResult::new(hit.timestamp)).unwrap();

        let mut reader = RecordReader::new(buf.as_slice());
        let first = reader.read().unwrap().unwrap();
        assert_eq!(first.timestamp, hit.timestamp);
        assert_eq!(first.latency, Duration::from_millis(42));
        assert_eq!(first.bytes_in, 4096);
        assert_eq!(first.status_code, 404);
        assert_eq!(first.error.as_deref(), Some("404 Not Found"));
        assert!(first.profile_missing);

        assert!(reader.read().unwrap().is_some());
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn truncated_record_is_an_error() {
        let mut buf = Vec::new();
        RecordWriter::new(&mut buf)
            .write(&HitResult::new(Utc::now()))
            .unwrap();
        buf.truncate(buf.len() - 3);

        let mut reader = RecordReader::new(buf.as_slice());
        assert!(reader.read().is_err());
    }
}
