mod filter_pipeline;
mod store_roundtrip;
