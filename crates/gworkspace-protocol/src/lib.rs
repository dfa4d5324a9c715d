pub mod jsonrpc;

pub use jsonrpc::{codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
