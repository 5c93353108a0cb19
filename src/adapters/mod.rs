pub mod credentials;
pub mod drive;
pub mod form_filler;
pub mod http_client;
pub mod sheets;
