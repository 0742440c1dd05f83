pub mod common;

mod incremental;
mod token_reuse;
