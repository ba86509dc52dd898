//! Client library for the openQA REST API.
//!
//! The client signs requests with the openQA API key/secret scheme,
//! retries transient failures with a fixed wait, and decodes JSON (or the
//! YAML the server occasionally sends) into [`serde_json::Value`].
//! Credentials are picked up from the usual `client.conf` locations, or
//! can be passed explicitly.
//!
//! # Quick Start
//!
//! ```no_run
//! use openqa_client::{Client, Method};
//!
//! # fn example() -> openqa_client::Result<()> {
//! let client = Client::new("openqa.fedoraproject.org", "")?;
//!
//! let jobs = client.get_jobs(None, Some("Fedora-Rawhide-20200227.n.0"), true)?;
//! for job in &jobs {
//!     println!("{}: {:?}", job.id, job.extra.get("result"));
//! }
//!
//! let overview = client.request(
//!     Method::GET,
//!     "jobs/overview",
//!     None,
//!     None,
//! )?;
//! println!("{}", overview);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod consts;
pub mod error;
pub mod params;
pub mod retry;

mod auth;

pub use client::{Client, Job};
pub use config::{ClientConfig, Credentials};
pub use error::{Error, Result};
pub use params::{ParamValue, Params, Setting};

/// HTTP method type, re-exported for calls to [`Client::request`].
pub use reqwest::Method;
