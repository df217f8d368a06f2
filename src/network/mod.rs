pub mod client;
pub mod firebase;
pub mod sse;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::StoreClient;
pub use firebase::FirebaseStore;
