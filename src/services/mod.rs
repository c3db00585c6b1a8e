pub mod conversation;
pub mod market;
pub mod pipeline;
