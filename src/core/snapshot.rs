/// Point-in-time view of pool occupancy.
///
/// Fields are read one by one without a common lock, so under load they may not
/// be mutually consistent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Live workers.
    pub pool_size: usize,
    /// Workers currently running a task.
    pub active: usize,
    /// Configured core size.
    pub core: usize,
    /// Configured max size.
    pub max: usize,
    /// Highest worker count ever reached.
    pub largest: usize,
    /// Tasks waiting in the admission queue.
    pub queued: usize,
    /// Accepted tasks that have not finished yet.
    pub in_flight: usize,
    /// Tasks run to completion, panicked ones included.
    pub completed: u64,
}
