mod accumulation;

pub use accumulation::{accumulate, accumulate_sharded};
