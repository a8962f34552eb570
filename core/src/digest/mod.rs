pub mod driver;
pub mod event;
pub mod export;
pub mod fingerprint;
pub mod key;
pub mod lookup;
pub mod policy;
pub mod project;
pub mod store;
pub mod vulnerability;
