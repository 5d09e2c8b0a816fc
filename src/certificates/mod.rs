// Certificate engine - parsing, metadata extraction, status classification,
// chain and key validation

pub mod chain;
pub mod keymatch;
pub mod metadata;
pub mod pem;
pub mod status;

#[cfg(test)]
pub mod testutil;
