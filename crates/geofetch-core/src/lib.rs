pub mod config;
pub mod logging;

pub mod fetch;
pub mod ftp_url;
pub mod raster;
pub mod storage;
