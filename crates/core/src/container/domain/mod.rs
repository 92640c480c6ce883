pub mod container_error;
pub mod opus_header;
pub mod opus_packet;
