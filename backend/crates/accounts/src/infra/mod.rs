//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod mailer;
pub mod postgres;

pub use mailer::TracingMailer;
pub use postgres::PgAccountRepository;
