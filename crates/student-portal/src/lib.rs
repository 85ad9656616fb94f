//! Student Portal - registration form, confirmation and listing pages.
//!
//! Registrations are validated here and stored through [`student_store`].
//! Pages are plain server-rendered HTML; user notices survive a redirect in a
//! signed cookie.

pub mod api;
pub mod config;
pub mod error;
pub mod notice;
pub mod pages;
pub mod validate;

pub use config::Config;
pub use error::PortalError;
pub use notice::{Notice, NoticeLevel, NoticeSigner, PendingNotice};
pub use validate::{is_valid_email, is_valid_phone};
