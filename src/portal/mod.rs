//! Portal backend layer: HTTP client, reply decoding, CAPTCHA handling, and
//! the manager that runs requests off the UI loop.

pub mod captcha;
pub mod client;
pub mod decode;
pub mod error;
pub mod manager;
pub mod types;
pub mod wire;
