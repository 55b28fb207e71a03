//! Domain types

mod fingerprint;

pub use fingerprint::FingerprintRecord;
