pub mod capture_backend;
pub mod encryptor;
pub mod engine_delegate;
pub mod ports;
