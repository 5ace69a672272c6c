// Adapters layer: concrete implementations for external systems (inference, storage).

pub mod http_llm;
pub mod storage;

pub use http_llm::HttpLlmClient;
pub use storage::LocalStorage;
