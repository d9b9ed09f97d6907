pub mod gallery;
pub mod listing_cache;
pub mod storage;
pub mod transcoder;
pub mod upload_pipeline;

#[cfg(test)]
pub(crate) mod testing;
