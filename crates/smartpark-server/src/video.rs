//! MJPEG streaming of the station's latest frame.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use smartpark_engine::ParkingStation;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const MJPEG_BOUNDARY: &str = "frame";
pub const MJPEG_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// One multipart section carrying a JPEG image.
pub fn mjpeg_part(jpeg: &[u8]) -> Bytes {
    let mut part = BytesMut::with_capacity(jpeg.len() + 48);
    part.extend_from_slice(b"--");
    part.extend_from_slice(MJPEG_BOUNDARY.as_bytes());
    part.extend_from_slice(b"\r\nContent-Type: image/jpeg\r\n\r\n");
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part.freeze()
}

/// Stream of the latest frame, one part per `interval`, until `shutdown`
/// is cancelled.
///
/// The first part is emitted immediately. When no frame has been captured
/// the placeholder image is sent, so clients always see something.
pub fn mjpeg_stream(
    station: Arc<ParkingStation>,
    interval: Duration,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    futures::stream::unfold(true, move |first| {
        let station = Arc::clone(&station);
        async move {
            if !first {
                tokio::time::sleep(interval).await;
            }
            Some((Ok(mjpeg_part(&station.frame_jpeg())), false))
        }
    })
    .take_until(shutdown.cancelled_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_layout() {
        let part = mjpeg_part(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let mut expected = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(&part[..], &expected[..]);
    }

    #[test]
    fn test_content_type_names_boundary() {
        assert!(MJPEG_CONTENT_TYPE.ends_with(&format!("boundary={MJPEG_BOUNDARY}")));
    }
}
