//! View Controllers
//!
//! Each controller owns the state its screen shows and talks to the API
//! through the service traits in [`crate::client`]. Rendering lives in
//! [`crate::render`].

pub mod auth;
pub mod dashboard;
pub mod upload;

pub use auth::{FormError, LoginForm, RegisterForm};
pub use dashboard::Dashboard;
pub use upload::{PdfFile, UploadEndpoints, UploadError, UploadTarget, UploadTester};
