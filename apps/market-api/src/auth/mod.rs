pub mod handshake;
pub mod middleware;
pub mod principal;
pub mod tokens;
