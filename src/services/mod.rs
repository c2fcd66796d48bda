pub mod classifier;
pub mod extractors;
pub mod fetcher;
pub mod harvester;
pub mod metrics;
pub mod multiserver;
pub mod packer;
pub mod resolver;
