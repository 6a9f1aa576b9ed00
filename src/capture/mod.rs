pub mod manager;

pub use manager::*;

use std::io::Cursor;

use base64::Engine;
use chrono::{DateTime, Utc};
use image::ImageFormat;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of the scan-answer flow, from the permission prompt through a
/// processed still image.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Permission,
    Denied,
    Stream,
    Captured,
    Processing,
    Error,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Camera,
    Upload,
}

/// An encoded still image. Downstream consumers are payload-format
/// agnostic: frames from the live camera and uploaded files both end up
/// here as base64 PNG.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CapturePayload {
    pub data: String,
    pub width: u32,
    pub height: u32,
    pub source: CaptureSource,
}

/// Token for the live camera stream held by the webview. The backend
/// tracks exactly one of these at a time; issuing a new handle always
/// releases the previous one first.
#[derive(Serialize, Clone, Debug)]
pub struct StreamHandle {
    pub id: Uuid,
    pub acquired_at: DateTime<Utc>,
}

impl StreamHandle {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            acquired_at: Utc::now(),
        }
    }
}

/// Result of (re)acquiring the camera: the handle that must be released,
/// if one was outstanding, and the newly issued one.
#[derive(Debug)]
pub struct StreamSwap {
    pub released: Option<StreamHandle>,
    pub acquired: StreamHandle,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot {action} while the capture flow is in the {state:?} state")]
    InvalidState {
        action: &'static str,
        state: CaptureState,
    },
    #[error("image data is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("image data could not be decoded: {0}")]
    UnreadableImage(#[from] image::ImageError),
}

/// Decode an incoming frame or file (raw base64 or a `data:` URL) and
/// re-encode it as a normalized base64 PNG payload.
pub fn normalize_image(raw: &str, source: CaptureSource) -> Result<CapturePayload, CaptureError> {
    let encoded = match raw.find("base64,") {
        Some(idx) => &raw[idx + "base64,".len()..],
        None => raw,
    };

    let bytes = base64::prelude::BASE64_STANDARD.decode(encoded.trim())?;
    let img = image::load_from_memory(&bytes)?;

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(CapturePayload {
        data: base64::prelude::BASE64_STANDARD.encode(&png),
        width: img.width(),
        height: img.height(),
        source,
    })
}

#[derive(Serialize, Clone, Debug)]
pub struct CaptureSnapshot {
    pub state: CaptureState,
    pub has_stream: bool,
    pub image: Option<CapturePayload>,
    pub last_error: Option<String>,
}

/// State machine for acquiring a camera stream or file upload and turning
/// it into a still image.
///
/// Transition methods return any `StreamHandle` that stopped being live so
/// the caller can tell the webview to stop its tracks; no transition
/// leaves the session holding more than one handle.
#[derive(Debug, Default)]
pub struct CaptureSession {
    state: CaptureState,
    stream: Option<StreamHandle>,
    image: Option<CapturePayload>,
    last_error: Option<String>,
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Permission
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn stream(&self) -> Option<&StreamHandle> {
        self.stream.as_ref()
    }

    pub fn image(&self) -> Option<&CapturePayload> {
        self.image.as_ref()
    }

    /// Acquire the camera, releasing any outstanding handle first. Valid
    /// from the permission prompt, after a denial or error (retry), while
    /// already streaming, and from `Captured` (retake).
    pub fn request_stream(&mut self, action: &'static str) -> Result<StreamSwap, CaptureError> {
        if self.state == CaptureState::Processing {
            return Err(CaptureError::InvalidState {
                action,
                state: self.state,
            });
        }

        let released = self.stream.take();
        let acquired = StreamHandle::new();
        self.stream = Some(acquired.clone());
        self.image = None;
        self.last_error = None;
        self.state = CaptureState::Stream;

        Ok(StreamSwap { released, acquired })
    }

    /// The user refused the permission prompt.
    pub fn deny(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Permission {
            return Err(CaptureError::InvalidState {
                action: "deny camera access",
                state: self.state,
            });
        }
        self.state = CaptureState::Denied;
        Ok(())
    }

    /// A still frame was read from the live stream. The stream handle is
    /// no longer needed and is handed back for release.
    pub fn capture_still(
        &mut self,
        payload: CapturePayload,
    ) -> Result<Option<StreamHandle>, CaptureError> {
        if self.state != CaptureState::Stream {
            return Err(CaptureError::InvalidState {
                action: "capture a photo",
                state: self.state,
            });
        }
        self.image = Some(payload);
        self.state = CaptureState::Captured;
        Ok(self.stream.take())
    }

    /// File-upload path into `Captured`: valid from any non-processing
    /// state and never acquires the camera. Releases a live handle if one
    /// exists.
    pub fn accept_upload(
        &mut self,
        payload: CapturePayload,
    ) -> Result<Option<StreamHandle>, CaptureError> {
        if self.state == CaptureState::Processing {
            return Err(CaptureError::InvalidState {
                action: "upload an image",
                state: self.state,
            });
        }
        self.image = Some(payload);
        self.last_error = None;
        self.state = CaptureState::Captured;
        Ok(self.stream.take())
    }

    /// Hand the captured image to the OCR stage.
    pub fn begin_processing(&mut self) -> Result<CapturePayload, CaptureError> {
        if self.state != CaptureState::Captured {
            return Err(CaptureError::InvalidState {
                action: "process the captured answer",
                state: self.state,
            });
        }
        match self.image.clone() {
            Some(payload) => {
                self.state = CaptureState::Processing;
                Ok(payload)
            }
            None => Err(CaptureError::InvalidState {
                action: "process the captured answer",
                state: self.state,
            }),
        }
    }

    /// Back to the permission prompt after a denial or device error.
    pub fn retry(&mut self) -> Result<(), CaptureError> {
        match self.state {
            CaptureState::Denied | CaptureState::Error => {
                self.state = CaptureState::Permission;
                self.last_error = None;
                Ok(())
            }
            state => Err(CaptureError::InvalidState {
                action: "retry camera access",
                state,
            }),
        }
    }

    /// Record a device failure; any live handle is handed back for release.
    pub fn fail(&mut self, message: impl Into<String>) -> Option<StreamHandle> {
        self.state = CaptureState::Error;
        self.last_error = Some(message.into());
        self.stream.take()
    }

    /// Drop everything and return to the permission prompt, e.g. when the
    /// user navigates away from the camera page.
    pub fn reset(&mut self) -> Option<StreamHandle> {
        self.state = CaptureState::Permission;
        self.image = None;
        self.last_error = None;
        self.stream.take()
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            state: self.state,
            has_stream: self.stream.is_some(),
            image: self.image.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
