pub mod artifacts;
pub mod client;
pub mod host;
pub mod poller;
pub mod service;
pub mod submitter;
