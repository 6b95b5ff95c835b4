// netfix Infrastructure - System Adapters
// Implements: CommandRunner, ProxySettingStore, HttpChecker

pub mod decode;
pub mod file_proxy_store;
pub mod http_checker;
pub mod registry_proxy_store;
pub mod subprocess_runner;

pub use decode::OutputDecoder;
pub use file_proxy_store::FileProxyStore;
pub use http_checker::ReqwestHttpChecker;
pub use registry_proxy_store::RegistryProxyStore;
pub use subprocess_runner::SubprocessRunner;
