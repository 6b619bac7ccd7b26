pub mod client_ip;
pub mod logging;
pub mod rate_limit;
pub mod webhook;
