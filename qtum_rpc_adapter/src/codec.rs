//! Hex/big-integer/address/amount conversions shared by every handler.
//!
//! Kept as a pure, stateless module: no hidden state, no global config. Every
//! function here is a total function over its documented input domain and
//! returns `AdapterError::InvalidParams` on malformed input.

use crate::errors::{AdapterError, AdapterResult};
use ethers::types::{H160, U256};
use sha2::{Digest, Sha256};

/// Qtum's assigned Base58Check version bytes. Distinct from Bitcoin's
/// `0x00`/`0x6f` and from most altcoins; see the Qtum address format docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QtumNetwork {
    Mainnet,
    Testnet,
}

impl QtumNetwork {
    fn version_byte(self) -> u8 {
        match self {
            QtumNetwork::Mainnet => 0x3a,
            QtumNetwork::Testnet => 0x78,
        }
    }
}

/// Encode a 20-byte Ethereum-style address into a Qtum Base58Check address.
pub fn encode_address_to_qtum(addr: H160, network: QtumNetwork) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(network.version_byte());
    payload.extend_from_slice(addr.as_bytes());

    bs58::encode(payload).with_check().into_string()
}

/// Decode a Qtum Base58Check address into the 20-byte Ethereum-style address
/// used throughout the rest of the adapter.
pub fn decode_address_from_qtum(address: &str, network: QtumNetwork) -> AdapterResult<H160> {
    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|err| AdapterError::InvalidParams(format!("bad qtum address: {err}")))?;

    let (version, body) = payload
        .split_first()
        .ok_or_else(|| AdapterError::InvalidParams("empty qtum address payload".into()))?;

    if *version != network.version_byte() {
        return Err(AdapterError::InvalidParams(format!(
            "address version byte {:#x} does not match expected network",
            version
        )));
    }

    if body.len() != 20 {
        return Err(AdapterError::InvalidParams(
            "qtum address payload is not 20 bytes".into(),
        ));
    }

    Ok(H160::from_slice(body))
}

/// double-SHA256, used only by tests to cross-check the checksum `bs58`
/// computes for us internally via the `check` feature.
#[cfg(test)]
fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

const WEI_PER_SATOSHI: u64 = 10_000_000_000; // 1e10

/// `satoshiToWei(s) = s * 10^10`.
pub fn satoshi_to_wei(satoshi: U256) -> U256 {
    satoshi * U256::from(WEI_PER_SATOSHI)
}

/// `weiToSatoshi(w)` truncates toward zero; `lossy` is true when `w mod 10^10
/// != 0`, i.e. when the wei value carries precision Qtum cannot represent.
pub fn wei_to_satoshi(wei: U256) -> (U256, bool) {
    let divisor = U256::from(WEI_PER_SATOSHI);
    let satoshi = wei / divisor;
    let lossy = wei % divisor != U256::zero();
    (satoshi, lossy)
}

/// Encode a nonnegative integer as an Ethereum `0x`-prefixed hex quantity:
/// no leading zeros, except the value zero which encodes to `0x0`.
pub fn encode_hex_quantity(value: U256) -> String {
    if value.is_zero() {
        return "0x0".to_string();
    }

    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);

    let first_nonzero = buf.iter().position(|b| *b != 0).unwrap_or(31);
    let trimmed = &buf[first_nonzero..];

    let mut hex = hex::encode(trimmed);
    // trim any remaining leading zero nibble (e.g. value 0x0f -> "0f" -> "f")
    while hex.starts_with('0') && hex.len() > 1 {
        hex.remove(0);
    }

    format!("0x{hex}")
}

/// Decode an Ethereum hex quantity. Accepts optional leading zeros; rejects
/// anything that isn't `0x`-prefixed valid hex.
pub fn decode_hex_quantity(value: &str) -> AdapterResult<U256> {
    let stripped = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| AdapterError::InvalidParams(format!("hex quantity missing 0x prefix: {value}")))?;

    if stripped.is_empty() {
        return Err(AdapterError::InvalidParams("empty hex quantity".into()));
    }

    U256::from_str_radix(stripped, 16)
        .map_err(|err| AdapterError::InvalidParams(format!("invalid hex quantity {value}: {err}")))
}

/// Encode raw bytes as a fixed-width `0x`-prefixed hex string, preserving
/// leading zeros. Used for hashes, 32-byte topics, and addresses.
pub fn encode_hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a `0x`-prefixed fixed-width hex byte string.
pub fn decode_hex_bytes(value: &str) -> AdapterResult<Vec<u8>> {
    let stripped = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| AdapterError::InvalidParams(format!("hex bytes missing 0x prefix: {value}")))?;

    hex::decode(stripped).map_err(|err| AdapterError::InvalidParams(format!("invalid hex bytes {value}: {err}")))
}
