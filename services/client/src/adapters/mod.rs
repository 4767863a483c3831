pub mod rest;
pub mod shell;
pub mod token_store;
pub mod transport;

pub use rest::RestClient;
pub use shell::{MemoryNavigator, TracingNotifier, TracingTitle};
pub use token_store::FileTokenStore;
pub use transport::HttpTransport;
