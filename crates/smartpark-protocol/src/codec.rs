//! Tokio codec for the controller line protocol.
//!
//! `ControllerCodec` turns the raw byte stream of the serial link into
//! [`ControllerMessage`] values and encodes [`GateCommand`] values as
//! newline-terminated lines.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use smartpark_protocol::{ControllerCodec, ControllerMessage, GateCommand};
//! use tokio_util::codec::Framed;
//!
//! # async fn example(port: tokio::io::DuplexStream) -> smartpark_core::Result<()> {
//! let mut framed = Framed::new(port, ControllerCodec::new());
//!
//! framed.send(GateCommand::Deny).await?;
//! while let Some(msg) = framed.next().await {
//!     if let ControllerMessage::VehicleDetected = msg? {
//!         framed.send(GateCommand::Open).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Recovery
//!
//! A `Framed` stream ends after the first decoder error, which would take
//! the whole serial link down over one garbled line. The decoder therefore
//! never fails on content: unparseable lines and oversized lines are
//! yielded as [`ControllerMessage::Malformed`] and decoding resumes at the
//! next terminator. Only I/O errors end the stream.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{ControllerMessage, GateCommand, LineParser};
use smartpark_core::{
    Error, Result,
    constants::{LINE_TERMINATOR, MAX_LINE_LENGTH},
};

/// Codec for the host side of the controller link.
#[derive(Debug)]
pub struct ControllerCodec {
    max_line_length: usize,
    /// Set while skipping the rest of an oversized line.
    discarding: bool,
}

impl ControllerCodec {
    pub fn new() -> Self {
        Self::with_max_line_length(MAX_LINE_LENGTH)
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            discarding: false,
        }
    }

    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn too_long(&self, size: usize) -> ControllerMessage {
        ControllerMessage::Malformed {
            line: String::new(),
            reason: Error::LineTooLong {
                size,
                max_size: self.max_line_length,
            }
            .to_string(),
        }
    }

    fn parse_line(bytes: &[u8]) -> Option<ControllerMessage> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(match LineParser::parse(text) {
            Ok(message) => message,
            Err(e) => ControllerMessage::Malformed {
                line: text.to_string(),
                reason: e.to_string(),
            },
        })
    }
}

impl Default for ControllerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ControllerCodec {
    type Item = ControllerMessage;
    type Error = Error;

    /// Decode the next non-blank line.
    ///
    /// The line (and its terminator) is consumed from `src` before parsing,
    /// so a bad line is never seen twice.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let newline = src.iter().position(|b| *b == b'\n');

            if self.discarding {
                match newline {
                    Some(pos) => {
                        src.advance(pos + 1);
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        src.clear();
                        return Ok(None);
                    }
                }
            }

            let Some(pos) = newline else {
                if src.len() > self.max_line_length {
                    let size = src.len();
                    src.clear();
                    self.discarding = true;
                    return Ok(Some(self.too_long(size)));
                }
                return Ok(None);
            };

            let line = src.split_to(pos + 1);
            if pos > self.max_line_length {
                return Ok(Some(self.too_long(pos)));
            }

            // Blank lines are keep-alives from some firmware builds.
            if let Some(message) = Self::parse_line(&line[..pos]) {
                return Ok(Some(message));
            }
        }
    }

    /// Flush a final unterminated line when the link closes.
    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(message) = self.decode(buf)? {
            return Ok(Some(message));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        let rest = buf.split();
        Ok(Self::parse_line(&rest))
    }
}

impl Encoder<GateCommand> for ControllerCodec {
    type Error = Error;

    fn encode(&mut self, item: GateCommand, dst: &mut BytesMut) -> Result<()> {
        let line = item.as_line();
        dst.reserve(line.len() + LINE_TERMINATOR.len());
        dst.put_slice(line.as_bytes());
        dst.put_slice(LINE_TERMINATOR.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpark_core::SlotState;

    #[test]
    fn test_codec_default() {
        let codec = ControllerCodec::default();
        assert_eq!(codec.max_line_length(), MAX_LINE_LENGTH);
    }

    #[test]
    fn test_decode_complete_line() {
        let mut codec = ControllerCodec::new();
        let mut buffer = BytesMut::from(&b"DETECTADO\n"[..]);

        let msg = codec.decode(&mut buffer).unwrap();
        assert_eq!(msg, Some(ControllerMessage::VehicleDetected));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = ControllerCodec::new();
        let mut buffer = BytesMut::from(&b"ESTADO:0,1"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b",2,0\r\n");
        let msg = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(
            msg,
            ControllerMessage::SlotStates(vec![
                SlotState::Vacant,
                SlotState::Occupied,
                SlotState::Reserved,
                SlotState::Vacant,
            ])
        );
    }

    #[test]
    fn test_decode_multiple_lines_in_buffer() {
        let mut codec = ControllerCodec::new();
        let mut buffer = BytesMut::from(&b"\nDETECTADO\nhola\n"[..]);

        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(ControllerMessage::VehicleDetected)
        );
        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(ControllerMessage::Other("hola".to_string()))
        );
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_decode_malformed_line_keeps_stream() {
        let mut codec = ControllerCodec::new();
        let mut buffer = BytesMut::from(&b"ESTADO:9,x\nDETECTADO\n"[..]);

        match codec.decode(&mut buffer).unwrap() {
            Some(ControllerMessage::Malformed { line, .. }) => assert_eq!(line, "ESTADO:9,x"),
            other => panic!("Expected Malformed, got {:?}", other),
        }
        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(ControllerMessage::VehicleDetected)
        );
    }

    #[test]
    fn test_decode_line_too_long_is_discarded() {
        let mut codec = ControllerCodec::with_max_line_length(12);
        let mut buffer = BytesMut::from(&b"ESTADO:0,0,0,0,0"[..]);

        assert!(matches!(
            codec.decode(&mut buffer).unwrap(),
            Some(ControllerMessage::Malformed { .. })
        ));
        assert!(buffer.is_empty());

        // Tail of the oversized line is skipped, the next line decodes.
        buffer.extend_from_slice(b",0,0\nDETECTADO\n");
        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(ControllerMessage::VehicleDetected)
        );
    }

    #[test]
    fn test_decode_eof_flushes_unterminated_line() {
        let mut codec = ControllerCodec::new();
        let mut buffer = BytesMut::from(&b"DETECTADO"[..]);

        assert_eq!(
            codec.decode_eof(&mut buffer).unwrap(),
            Some(ControllerMessage::VehicleDetected)
        );
        assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_encode_commands() {
        let mut codec = ControllerCodec::new();
        let mut buffer = BytesMut::new();

        codec.encode(GateCommand::Open, &mut buffer).unwrap();
        codec.encode(GateCommand::Deny, &mut buffer).unwrap();
        codec
            .encode(
                GateCommand::Reservations(vec![SlotState::Reserved, SlotState::Vacant]),
                &mut buffer,
            )
            .unwrap();

        assert_eq!(&buffer[..], b"ABRIR\nDENEGADO\nRESERVA:2,0\n");
    }
}
