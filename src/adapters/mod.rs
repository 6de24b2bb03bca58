pub mod dialer;
pub mod ntp_client;
pub mod resolver;
