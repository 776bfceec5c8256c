pub mod http_client;
pub mod webhook_signatures;
