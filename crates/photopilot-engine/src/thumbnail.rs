use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use photopilot_contracts::error::AssistError;
use photopilot_contracts::wire::WirePart;
use tracing::{debug, warn};

use crate::host::DevelopHost;

pub const THUMBNAIL_SIZE: u32 = 512;
pub const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(5);
pub const THUMBNAIL_MIME: &str = "image/jpeg";

/// Asks the host for a `size`x`size` JPEG of `photo` and waits at most
/// `timeout` for the callback. Returns the base64 payload.
pub fn export_thumbnail<H: DevelopHost + ?Sized>(
    host: &H,
    photo: &str,
    size: u32,
    timeout: Duration,
) -> Result<String, AssistError> {
    let (tx, rx) = mpsc::channel();
    host.request_thumbnail(
        photo,
        size,
        size,
        Box::new(move |result| {
            // The receiver is gone once the wait has timed out.
            let _ = tx.send(result);
        }),
    )?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(bytes)) if bytes.is_empty() => Err(AssistError::HostFailure(
            "thumbnail render returned no data".to_string(),
        )),
        Ok(Ok(bytes)) => {
            debug!(photo, bytes = bytes.len(), "thumbnail ready");
            Ok(BASE64.encode(bytes))
        }
        Ok(Err(err)) => Err(AssistError::HostFailure(format!("{err:#}"))),
        Err(RecvTimeoutError::Timeout) => {
            warn!(photo, timeout_ms = timeout.as_millis() as u64, "thumbnail timed out");
            Err(AssistError::ThumbnailTimeout(timeout.as_millis() as u64))
        }
        Err(RecvTimeoutError::Disconnected) => Err(AssistError::HostFailure(
            "thumbnail callback was dropped".to_string(),
        )),
    }
}

pub fn thumbnail_part(data_base64: String) -> WirePart {
    WirePart::InlineImage {
        mime_type: THUMBNAIL_MIME.to_string(),
        data_base64,
    }
}
