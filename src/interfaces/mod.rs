pub mod providers;
pub mod search;
