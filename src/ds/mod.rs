pub mod recency_list;
pub mod shard;
pub mod slot_arena;

pub use recency_list::RecencyList;
pub use shard::{distribute_capacity, ShardSelector};
pub use slot_arena::{SlotArena, SlotId};
