mod client;
mod transport;


pub use batchgate_coalesced::{BatchRequest, Item, ItemsResponse};
pub use client::{GatewayClient, GatewayConfig, GatewayRequest};
pub use transport::ReqwestTransport;
