//! Human readable reasons for reverted calls.

use alloy::sol_types::{Panic, Revert, SolError};

/// The reason reported when a revert payload carries no decodable message.
pub const GENERIC: &str = "transaction reverted";

/// Decodes the reason from a raw revert payload.
///
/// Recognizes the Solidity `Error(string)` and `Panic(uint256)` payloads.
/// Anything else, including empty or truncated payloads and custom errors,
/// results in [`GENERIC`].
pub fn decode(payload: &[u8]) -> String {
    if let Ok(revert) = Revert::abi_decode(payload) {
        if !revert.reason.trim().is_empty() {
            return revert.reason;
        }
    } else if let Ok(panic) = Panic::abi_decode(payload) {
        return format!("panic code {:#x}", panic.code);
    }
    GENERIC.to_owned()
}
