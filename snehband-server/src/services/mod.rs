//! Outbound integrations: SMTP delivery and image CDN uploads

pub mod image_store;
pub mod mailer;

pub use image_store::{CdnImageStore, DisabledImageStore, ImageStore};
pub use mailer::{DisabledMailer, Mailer, SmtpMailer};
