mod config;
mod request;
mod service;
mod transport;


pub use config::{normalize_endpoint, CoalescerConfig};
pub use request::{BatchRequest, Item, ItemsResponse};
pub use service::{Coalescer, Enrollment};
pub use transport::Transport;
