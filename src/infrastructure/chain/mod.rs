//! Chain Reader - read access to pool, price and strategy contracts

mod http_reader;
mod memory_reader;
mod reader;

pub use http_reader::HttpChainReader;
pub use memory_reader::InMemoryChainReader;
pub use reader::ChainReader;
