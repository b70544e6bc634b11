pub mod config;
pub mod constants;
pub mod daily;
pub mod data;
pub mod error;
pub mod pipeline;
#[cfg(test)]
pub mod test;
pub mod util {
    pub mod chart;
    pub mod file_utils;
    #[cfg(test)]
    pub mod test_utils;
}

/// Build-time information generated by `build.rs`
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
