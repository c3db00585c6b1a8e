pub mod azure;
pub mod exa;
pub mod retry;
