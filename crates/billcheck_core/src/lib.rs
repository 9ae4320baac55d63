//! Session core for the BillCheck client: file selection, preview decoding,
//! and submission of bill images to the remote authenticity classifier.
//!
//! The GUI crate drives a [`Session`] through its transition methods and
//! renders the read-only [`Snapshot`]; everything asynchronous (preview
//! decode, HTTP round trip) is applied in [`Session::poll`].

mod client;
mod preview;
mod session;

pub use client::{
    BASE_URL_ENV, DEFAULT_BASE_URL, Endpoint, InferenceClient, PredictError, Prediction,
    format_confidence,
};
pub use preview::PreviewImage;
pub use session::{FileHandle, RequestPhase, SUBMIT_FAILED_MESSAGE, Session, Snapshot};
