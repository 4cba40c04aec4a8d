// SPDX-License-Identifier: Apache-2.0
//! Snapshot quantization, baseline/delta framing, and binary encoding
//! (§4.5).

pub mod delta;
pub mod encode;
pub mod frame;
pub mod quantize;

pub use delta::SessionSnapshotState;
pub use encode::{checksum16, encode_baseline, encode_delta, verify_checksum};
pub use frame::{
    build_baseline, BaselineFrame, DeltaFrame, QuantizedModule, QuantizedPlayer,
    QuantizedProjectile, QuantizedShip,
};
