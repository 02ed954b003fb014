pub mod fifo_drop_oldest_queue;
pub mod isolated_forwarder;
pub mod latest1_queue;

pub use fifo_drop_oldest_queue::*;
pub use isolated_forwarder::*;
pub use latest1_queue::*;

pub enum QueueKind {
    /// Only the most recent value matters; older ones are overwritten.
    Latest1,
    FifoDropOldest { capacity: usize },
    /// Delivered through a drain task into a bounded channel.
    Isolated { output_buffer: usize },
}
