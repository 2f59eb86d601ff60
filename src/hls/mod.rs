pub mod classify;
pub mod rewrite;
