pub mod bulk;
pub mod cluster_health;
pub mod document;
pub mod index_meta;
pub mod scroll_response;
pub mod server_info;
