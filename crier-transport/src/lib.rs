//! Email delivery transports.
//!
//! A [`Transport`] is a connected delivery channel that ships one rendered
//! message at a time. A [`TransportFactory`] turns the provider settings
//! carried in a job's configuration into a live transport, so the rest of
//! the engine never names a concrete provider.
//!
//! Three providers are built in: SMTP relays, Amazon SES, and generic JSON
//! mail APIs. [`MockTransport`] backs the test suites.

pub mod config;
pub mod error;
pub mod factory;
pub mod http_api;
pub mod message;
pub mod mock;
pub mod ses;
pub mod smtp;
pub mod r#trait;

pub use config::{HttpApiConfig, SesConfig, SmtpConfig, SmtpTls, TransportConfig};
pub use error::{Result, TransportError};
pub use factory::ProviderFactory;
pub use http_api::HttpApiTransport;
pub use message::EmailMessage;
pub use mock::{MockFactory, MockTransport};
pub use ses::SesTransport;
pub use smtp::SmtpTransport;
pub use r#trait::{Transport, TransportFactory};
