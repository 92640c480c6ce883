pub mod ogg_demuxer;
pub mod ogg_muxer;
pub mod ogg_page;
