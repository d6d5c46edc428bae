pub mod declared_size;
pub mod request_id;
