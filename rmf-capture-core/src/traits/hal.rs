use crate::models::error::CaptureError;
use crate::models::handle::Handle;
use crate::models::settings::Settings;
use crate::models::state::Status;

/// The capture control boundary, as a vendor driver exposes it.
///
/// Output parameters are `Option<&mut T>` so the "caller passed no output
/// slot" precondition stays expressible; a `None` output is an
/// `InvalidArgument` failure. Handle-shaped inputs, including
/// [`Handle::NULL`], fail with `InvalidHandle` when not valid.
///
/// Check order within one call: handle, then arguments, then state.
pub trait AudioCaptureHal: Send + Sync {
    /// Open the primary session.
    fn open(&self, handle: Option<&mut Handle>) -> Result<(), CaptureError>;

    /// Open the session named by `capture_type` (`"primary"` or `"auxiliary"`).
    fn open_type(&self, handle: Option<&mut Handle>, capture_type: &str) -> Result<(), CaptureError>;

    fn close(&self, handle: Handle) -> Result<(), CaptureError>;

    fn start(&self, handle: Handle, settings: Option<&Settings>) -> Result<(), CaptureError>;

    /// Returns only after delivery to the session's sink has ceased.
    fn stop(&self, handle: Handle) -> Result<(), CaptureError>;

    fn get_status(&self, handle: Handle, status: Option<&mut Status>) -> Result<(), CaptureError>;

    fn get_default_settings(&self, settings: Option<&mut Settings>) -> Result<(), CaptureError>;

    fn get_current_settings(&self, handle: Handle, settings: Option<&mut Settings>) -> Result<(), CaptureError>;
}
