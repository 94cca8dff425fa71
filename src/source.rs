use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::inference::RecordedPose;

/// One unit of input with its media timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<P> {
    pub timestamp_ms: u64,
    pub payload: P,
}

/// Where frames come from. `Ok(None)` ends the stream.
pub trait FrameSource {
    type Payload;

    fn read_frame(&mut self) -> Result<Option<Frame<Self::Payload>>>;
}

/// Pose recording stored as JSON lines, one [`RecordedPose`] per line.
pub struct Recording<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl Recording<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("opening recording {}", path.display()))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> Recording<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> FrameSource for Recording<R> {
    type Payload = RecordedPose;

    /// A malformed line is reported as an error after it has been consumed,
    /// so the next call continues with the following line.
    fn read_frame(&mut self) -> Result<Option<Frame<RecordedPose>>> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_line(&mut self.buf)
                .with_context(|| format!("reading recording line {}", self.line_no + 1))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let pose: RecordedPose = match serde_json::from_str(line) {
                Ok(pose) => pose,
                Err(e) => bail!("recording line {}: {e}", self.line_no),
            };
            return Ok(Some(Frame {
                timestamp_ms: pose.timestamp_ms,
                payload: pose,
            }));
        }
    }
}

/// Adapts any iterator of frames, mostly for tests and embedding.
pub struct FrameIter<I>(pub I);

impl<P, I> FrameSource for FrameIter<I>
where
    I: Iterator<Item = Frame<P>>,
{
    type Payload = P;

    fn read_frame(&mut self) -> Result<Option<Frame<P>>> {
        Ok(self.0.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_frames_and_skips_blank_lines() {
        let data = "{\"t\": 0, \"keypoints\": null}\n\n{\"t\": 40}\n";
        let mut rec = Recording::from_reader(Cursor::new(data));

        let first = rec.read_frame().unwrap().unwrap();
        assert_eq!(first.timestamp_ms, 0);
        assert_eq!(first.payload.keypoints, None);

        let second = rec.read_frame().unwrap().unwrap();
        assert_eq!(second.timestamp_ms, 40);
        assert!(rec.read_frame().unwrap().is_none());
    }

    #[test]
    fn bad_line_is_an_error_but_reading_continues() {
        let data = "{\"t\": 0}\nnot json\n{\"t\": 80}\n";
        let mut rec = Recording::from_reader(Cursor::new(data));

        assert!(rec.read_frame().unwrap().is_some());
        let err = rec.read_frame().unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert_eq!(rec.read_frame().unwrap().unwrap().timestamp_ms, 80);
    }

    #[test]
    fn iterator_source() {
        let frames = (0..3).map(|i| Frame {
            timestamp_ms: i * 100,
            payload: i,
        });
        let mut src = FrameIter(frames);
        let mut seen = Vec::new();
        while let Some(f) = src.read_frame().unwrap() {
            seen.push(f.payload);
        }
        assert_eq!(seen, vec![0, 1, 2]);
    }
}
