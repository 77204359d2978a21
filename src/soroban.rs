//! Network-supplied contract execution metadata
//!
//! Simulation returns a resource footprint (`SorobanTransactionData`) and
//! authorization entries. Both are merged into the transaction verbatim:
//! ledger keys and authorization entries are kept as the exact bytes the
//! network produced. To find where one ends inside an envelope the walker
//! below steps over their structure without building it.

use crate::error::{Result, XdrAsmError};
use crate::serialization::{
    decode_bool, decode_i32, decode_i64, decode_len, decode_u32, encode_fixed_opaque,
    encode_i32, encode_i64, encode_u32, helpers, take, ByteDeserialize, ByteSerialize,
};
use std::io::Cursor;

const UNBOUNDED: u32 = u32::MAX;
const MAX_DEPTH: usize = 64;

/// A ledger key from a footprint, kept as raw XDR
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey(pub Vec<u8>);

impl ByteSerialize for LedgerKey {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        encode_fixed_opaque(&self.0, writer)
    }
}

impl ByteDeserialize for LedgerKey {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(LedgerKey(capture(cursor, walk::ledger_key)?))
    }
}

/// A `SorobanAuthorizationEntry`, kept as raw XDR
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorizationEntry(pub Vec<u8>);

impl AuthorizationEntry {
    /// Validate and wrap one base64 entry as returned by simulation
    pub fn from_base64(text: &str) -> Result<Self> {
        Self::from_xdr_base64(text)
    }
}

impl ByteSerialize for AuthorizationEntry {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        encode_fixed_opaque(&self.0, writer)
    }
}

impl ByteDeserialize for AuthorizationEntry {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(AuthorizationEntry(capture(cursor, walk::authorization_entry)?))
    }
}

/// Read and write sets of ledger entries touched by the invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFootprint {
    pub read_only: Vec<LedgerKey>,
    pub read_write: Vec<LedgerKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SorobanResources {
    pub footprint: LedgerFootprint,
    pub instructions: u32,
    pub disk_read_bytes: u32,
    pub write_bytes: u32,
}

/// Transaction extension carried by contract-invoking transactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SorobanTransactionData {
    /// Indices of archived footprint entries to restore (extension v1)
    pub archived_entries: Option<Vec<u32>>,
    pub resources: SorobanResources,
    pub resource_fee: i64,
}

impl ByteSerialize for SorobanTransactionData {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        match &self.archived_entries {
            None => encode_i32(0, writer)?,
            Some(indices) => {
                encode_i32(1, writer)?;
                crate::serialization::encode_len(indices.len(), UNBOUNDED, writer)?;
                for index in indices {
                    encode_u32(*index, writer)?;
                }
            }
        }

        let resources = &self.resources;
        helpers::serialize_vec(&resources.footprint.read_only, UNBOUNDED, writer)?;
        helpers::serialize_vec(&resources.footprint.read_write, UNBOUNDED, writer)?;
        encode_u32(resources.instructions, writer)?;
        encode_u32(resources.disk_read_bytes, writer)?;
        encode_u32(resources.write_bytes, writer)?;
        encode_i64(self.resource_fee, writer)
    }
}

impl ByteDeserialize for SorobanTransactionData {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let archived_entries = match decode_i32(cursor)? {
            0 => None,
            1 => {
                let count = decode_len(cursor, UNBOUNDED)?;
                let mut indices = Vec::with_capacity(count);
                for _ in 0..count {
                    indices.push(decode_u32(cursor)?);
                }
                Some(indices)
            }
            other => {
                return Err(XdrAsmError::MalformedEnvelope(format!(
                    "unknown resources extension {}",
                    other
                )))
            }
        };

        let read_only = helpers::deserialize_vec(cursor, UNBOUNDED)?;
        let read_write = helpers::deserialize_vec(cursor, UNBOUNDED)?;
        let instructions = decode_u32(cursor)?;
        let disk_read_bytes = decode_u32(cursor)?;
        let write_bytes = decode_u32(cursor)?;
        let resource_fee = decode_i64(cursor)?;

        Ok(SorobanTransactionData {
            archived_entries,
            resources: SorobanResources {
                footprint: LedgerFootprint { read_only, read_write },
                instructions,
                disk_read_bytes,
                write_bytes,
            },
            resource_fee,
        })
    }
}

/// Run a walker and return the exact bytes it stepped over
fn capture(
    cursor: &mut Cursor<&[u8]>,
    walker: fn(&mut Cursor<&[u8]>, usize) -> Result<()>,
) -> Result<Vec<u8>> {
    let start = cursor.position() as usize;
    walker(cursor, 0)?;
    let end = cursor.position() as usize;
    Ok(cursor.get_ref()[start..end].to_vec())
}

/// Structural walkers for the XDR types kept verbatim.
///
/// Each function advances the cursor past exactly one value and validates
/// discriminants and padding on the way.
mod walk {
    use super::*;
    use crate::serialization::{decode_fixed_opaque, decode_var_opaque};

    type Walk = Result<()>;

    fn unknown(what: &str, tag: i32) -> XdrAsmError {
        XdrAsmError::MalformedEnvelope(format!("unknown {} discriminant {}", what, tag))
    }

    fn nest(depth: usize) -> Result<usize> {
        if depth >= MAX_DEPTH {
            return Err(XdrAsmError::MalformedEnvelope("value nested too deeply".to_string()));
        }
        Ok(depth + 1)
    }

    fn skip(cursor: &mut Cursor<&[u8]>, n: usize) -> Walk {
        take(cursor, n).map(|_| ())
    }

    fn opaque(cursor: &mut Cursor<&[u8]>) -> Walk {
        decode_var_opaque(cursor, UNBOUNDED).map(|_| ())
    }

    fn hash(cursor: &mut Cursor<&[u8]>) -> Walk {
        decode_fixed_opaque::<32>(cursor).map(|_| ())
    }

    fn array(cursor: &mut Cursor<&[u8]>, depth: usize, item: fn(&mut Cursor<&[u8]>, usize) -> Walk) -> Walk {
        let count = decode_len(cursor, UNBOUNDED)?;
        for _ in 0..count {
            item(cursor, depth)?;
        }
        Ok(())
    }

    fn account_id(cursor: &mut Cursor<&[u8]>) -> Walk {
        match decode_i32(cursor)? {
            0 => hash(cursor),
            tag => Err(unknown("public key", tag)),
        }
    }

    pub fn sc_address(cursor: &mut Cursor<&[u8]>) -> Walk {
        match decode_i32(cursor)? {
            0 => account_id(cursor),
            1 => hash(cursor),
            // muxed account: id + key
            2 => skip(cursor, 8).and_then(|_| hash(cursor)),
            // claimable balance id (v0 hash)
            3 => match decode_i32(cursor)? {
                0 => hash(cursor),
                tag => Err(unknown("claimable balance id", tag)),
            },
            4 => hash(cursor),
            tag => Err(unknown("address", tag)),
        }
    }

    fn sc_map(cursor: &mut Cursor<&[u8]>, depth: usize) -> Walk {
        let count = decode_len(cursor, UNBOUNDED)?;
        for _ in 0..count {
            sc_val(cursor, depth)?;
            sc_val(cursor, depth)?;
        }
        Ok(())
    }

    fn contract_executable(cursor: &mut Cursor<&[u8]>) -> Walk {
        match decode_i32(cursor)? {
            0 => hash(cursor),
            1 => Ok(()),
            tag => Err(unknown("contract executable", tag)),
        }
    }

    pub fn sc_val(cursor: &mut Cursor<&[u8]>, depth: usize) -> Walk {
        let depth = nest(depth)?;
        match decode_i32(cursor)? {
            // bool
            0 => decode_bool(cursor).map(|_| ()),
            // void, ledger-key contract instance
            1 | 20 => Ok(()),
            // error: type + code
            2 => skip(cursor, 8),
            // u32, i32
            3 | 4 => skip(cursor, 4),
            // u64, i64, timepoint, duration, ledger-key nonce
            5..=8 | 21 => skip(cursor, 8),
            // u128, i128
            9 | 10 => skip(cursor, 16),
            // u256, i256
            11 | 12 => skip(cursor, 32),
            // bytes, string, symbol
            13..=15 => opaque(cursor),
            16 => {
                if decode_bool(cursor)? {
                    array(cursor, depth, sc_val)?;
                }
                Ok(())
            }
            17 => {
                if decode_bool(cursor)? {
                    sc_map(cursor, depth)?;
                }
                Ok(())
            }
            18 => sc_address(cursor),
            19 => {
                contract_executable(cursor)?;
                if decode_bool(cursor)? {
                    sc_map(cursor, depth)?;
                }
                Ok(())
            }
            tag => Err(unknown("value", tag)),
        }
    }

    fn asset_arm(cursor: &mut Cursor<&[u8]>, tag: i32) -> Walk {
        match tag {
            0 => Ok(()),
            1 => skip(cursor, 4).and_then(|_| account_id(cursor)),
            2 => skip(cursor, 12).and_then(|_| account_id(cursor)),
            tag => Err(unknown("asset", tag)),
        }
    }

    fn asset(cursor: &mut Cursor<&[u8]>) -> Walk {
        let tag = decode_i32(cursor)?;
        asset_arm(cursor, tag)
    }

    fn trust_line_asset(cursor: &mut Cursor<&[u8]>) -> Walk {
        match decode_i32(cursor)? {
            // pool share
            3 => hash(cursor),
            tag => asset_arm(cursor, tag),
        }
    }

    pub fn ledger_key(cursor: &mut Cursor<&[u8]>, depth: usize) -> Walk {
        match decode_i32(cursor)? {
            // account
            0 => account_id(cursor),
            // trustline
            1 => account_id(cursor).and_then(|_| trust_line_asset(cursor)),
            // offer
            2 => account_id(cursor).and_then(|_| skip(cursor, 8)),
            // data entry: account + string64
            3 => account_id(cursor).and_then(|_| decode_var_opaque(cursor, 64).map(|_| ())),
            // claimable balance
            4 => match decode_i32(cursor)? {
                0 => hash(cursor),
                tag => Err(unknown("claimable balance id", tag)),
            },
            // liquidity pool, contract code, ttl
            5 | 7 | 9 => hash(cursor),
            // contract data: contract, key, durability
            6 => {
                sc_address(cursor)?;
                sc_val(cursor, depth)?;
                match decode_i32(cursor)? {
                    0 | 1 => Ok(()),
                    tag => Err(unknown("durability", tag)),
                }
            }
            // config setting id
            8 => skip(cursor, 4),
            tag => Err(unknown("ledger key", tag)),
        }
    }

    fn invoke_contract_args(cursor: &mut Cursor<&[u8]>, depth: usize) -> Walk {
        sc_address(cursor)?;
        decode_var_opaque(cursor, 32)?;
        array(cursor, depth, sc_val)
    }

    fn contract_id_preimage(cursor: &mut Cursor<&[u8]>) -> Walk {
        match decode_i32(cursor)? {
            0 => sc_address(cursor).and_then(|_| hash(cursor)),
            1 => asset(cursor),
            tag => Err(unknown("contract id preimage", tag)),
        }
    }

    fn authorized_invocation(cursor: &mut Cursor<&[u8]>, depth: usize) -> Walk {
        let depth = nest(depth)?;
        match decode_i32(cursor)? {
            0 => invoke_contract_args(cursor, depth)?,
            1 => {
                contract_id_preimage(cursor)?;
                contract_executable(cursor)?;
            }
            2 => {
                contract_id_preimage(cursor)?;
                contract_executable(cursor)?;
                array(cursor, depth, sc_val)?;
            }
            tag => return Err(unknown("authorized function", tag)),
        }
        array(cursor, depth, authorized_invocation)
    }

    pub fn authorization_entry(cursor: &mut Cursor<&[u8]>, depth: usize) -> Walk {
        match decode_i32(cursor)? {
            // source account credentials
            0 => {}
            // address credentials: address, nonce, expiration ledger, signature
            1 => {
                sc_address(cursor)?;
                skip(cursor, 12)?;
                sc_val(cursor, depth)?;
            }
            tag => return Err(unknown("credentials", tag)),
        }
        authorized_invocation(cursor, depth)
    }
}
