pub mod collect;
pub mod devices;
pub mod health;
pub mod pages;
pub mod query;
pub mod referrers;
pub mod sites;
pub mod stats;
pub mod timeseries;
pub mod vitals;
