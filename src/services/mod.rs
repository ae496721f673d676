pub mod api;
pub mod download;
pub mod poller;
pub mod session;
