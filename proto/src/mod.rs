//! Rust bindings for the P4Runtime protocol, generated by `build.rs` from the
//! `.proto` files under `p4runtime/` and `googleapis/`.

pub mod p4info;
pub mod p4runtime;
pub mod p4runtime_grpc;
pub mod status;
