//! Account and contract identifiers
//!
//! Identities arrive as strkeys (`G…` accounts, `M…` muxed accounts,
//! `C…` contracts) and travel on the wire as raw 32-byte keys wrapped in
//! the appropriate union discriminant.

use crate::error::{Result, XdrAsmError};
use crate::serialization::{
    decode_fixed_opaque, decode_i32, decode_u64, encode_fixed_opaque, encode_i32, encode_u64,
    ByteDeserialize, ByteSerialize,
};
use std::fmt;
use std::io::Cursor;
use stellar_strkey::{ed25519, Strkey};

/// `PublicKeyType::PUBLIC_KEY_TYPE_ED25519`
pub const PUBLIC_KEY_TYPE_ED25519: i32 = 0;
/// `CryptoKeyType::KEY_TYPE_ED25519`
pub const KEY_TYPE_ED25519: i32 = 0;
/// `CryptoKeyType::KEY_TYPE_MUXED_ED25519`
pub const KEY_TYPE_MUXED_ED25519: i32 = 0x100;
/// `SCAddressType::SC_ADDRESS_TYPE_ACCOUNT`
pub const SC_ADDRESS_TYPE_ACCOUNT: i32 = 0;
/// `SCAddressType::SC_ADDRESS_TYPE_CONTRACT`
pub const SC_ADDRESS_TYPE_CONTRACT: i32 = 1;

fn decode_strkey(text: &str) -> Result<Strkey> {
    Strkey::from_string(text.trim())
        .map_err(|e| XdrAsmError::InvalidAddress(format!("{:?}: {:?}", text, e)))
}

fn to_key(bytes: &[u8]) -> Result<[u8; 32]> {
    bytes.try_into().map_err(|_| {
        XdrAsmError::InvalidAddress(format!("expected 32 key bytes, got {}", bytes.len()))
    })
}

/// Ed25519 account public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// Decode a `G…` strkey
    pub fn from_strkey(text: &str) -> Result<Self> {
        match decode_strkey(text)? {
            Strkey::PublicKeyEd25519(key) => Ok(AccountId(key.0)),
            _ => Err(XdrAsmError::InvalidAddress(format!(
                "{:?} is not an account address",
                text
            ))),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(AccountId(to_key(bytes)?))
    }

    pub fn to_strkey(&self) -> String {
        Strkey::PublicKeyEd25519(ed25519::PublicKey(self.0)).to_string()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_strkey())
    }
}

// Encoded as the `PublicKey` union
impl ByteSerialize for AccountId {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        encode_i32(PUBLIC_KEY_TYPE_ED25519, writer)?;
        encode_fixed_opaque(&self.0, writer)
    }
}

impl ByteDeserialize for AccountId {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        match decode_i32(cursor)? {
            PUBLIC_KEY_TYPE_ED25519 => Ok(AccountId(decode_fixed_opaque(cursor)?)),
            other => Err(XdrAsmError::MalformedEnvelope(format!(
                "unknown public key type {}",
                other
            ))),
        }
    }
}

/// Contract instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractId(pub [u8; 32]);

impl ContractId {
    /// Decode a `C…` strkey
    pub fn from_strkey(text: &str) -> Result<Self> {
        match decode_strkey(text)? {
            Strkey::Contract(contract) => Ok(ContractId(contract.0)),
            _ => Err(XdrAsmError::InvalidAddress(format!(
                "{:?} is not a contract address",
                text
            ))),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(ContractId(to_key(bytes)?))
    }

    pub fn to_strkey(&self) -> String {
        Strkey::Contract(stellar_strkey::Contract(self.0)).to_string()
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_strkey())
    }
}

/// Transaction-level account, optionally multiplexed with a 64-bit id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuxedAccount {
    Ed25519(AccountId),
    Muxed { id: u64, account: AccountId },
}

impl MuxedAccount {
    /// Decode a `G…` or `M…` strkey
    pub fn from_strkey(text: &str) -> Result<Self> {
        match decode_strkey(text)? {
            Strkey::PublicKeyEd25519(key) => Ok(MuxedAccount::Ed25519(AccountId(key.0))),
            Strkey::MuxedAccountEd25519(muxed) => Ok(MuxedAccount::Muxed {
                id: muxed.id,
                account: AccountId(muxed.ed25519),
            }),
            _ => Err(XdrAsmError::InvalidAddress(format!(
                "{:?} is not an account address",
                text
            ))),
        }
    }

    /// The underlying ed25519 account
    pub fn account(&self) -> AccountId {
        match self {
            MuxedAccount::Ed25519(account) => *account,
            MuxedAccount::Muxed { account, .. } => *account,
        }
    }
}

impl From<AccountId> for MuxedAccount {
    fn from(account: AccountId) -> Self {
        MuxedAccount::Ed25519(account)
    }
}

impl ByteSerialize for MuxedAccount {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        match self {
            MuxedAccount::Ed25519(account) => {
                encode_i32(KEY_TYPE_ED25519, writer)?;
                encode_fixed_opaque(&account.0, writer)
            }
            MuxedAccount::Muxed { id, account } => {
                encode_i32(KEY_TYPE_MUXED_ED25519, writer)?;
                encode_u64(*id, writer)?;
                encode_fixed_opaque(&account.0, writer)
            }
        }
    }
}

impl ByteDeserialize for MuxedAccount {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        match decode_i32(cursor)? {
            KEY_TYPE_ED25519 => Ok(MuxedAccount::Ed25519(AccountId(decode_fixed_opaque(cursor)?))),
            KEY_TYPE_MUXED_ED25519 => {
                let id = decode_u64(cursor)?;
                let account = AccountId(decode_fixed_opaque(cursor)?);
                Ok(MuxedAccount::Muxed { id, account })
            }
            other => Err(XdrAsmError::MalformedEnvelope(format!(
                "unknown muxed account type {}",
                other
            ))),
        }
    }
}

/// Whether a contract argument names an account or a contract. Both carry
/// 32 bytes; only the wire tag differs, so the caller must say which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Account,
    Contract,
}

/// Address as seen by contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScAddress {
    Account(AccountId),
    Contract(ContractId),
}

impl ScAddress {
    /// Decode a strkey, requiring it to be of the declared kind
    pub fn from_strkey(text: &str, kind: AddressKind) -> Result<Self> {
        match kind {
            AddressKind::Account => Ok(ScAddress::Account(AccountId::from_strkey(text)?)),
            AddressKind::Contract => Ok(ScAddress::Contract(ContractId::from_strkey(text)?)),
        }
    }
}

impl ByteSerialize for ScAddress {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        match self {
            ScAddress::Account(account) => {
                encode_i32(SC_ADDRESS_TYPE_ACCOUNT, writer)?;
                account.serialize_bytes(writer)
            }
            ScAddress::Contract(contract) => {
                encode_i32(SC_ADDRESS_TYPE_CONTRACT, writer)?;
                encode_fixed_opaque(&contract.0, writer)
            }
        }
    }
}

impl ByteDeserialize for ScAddress {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        match decode_i32(cursor)? {
            SC_ADDRESS_TYPE_ACCOUNT => Ok(ScAddress::Account(AccountId::deserialize_bytes(cursor)?)),
            SC_ADDRESS_TYPE_CONTRACT => Ok(ScAddress::Contract(ContractId(decode_fixed_opaque(cursor)?))),
            other => Err(XdrAsmError::MalformedEnvelope(format!(
                "unsupported address type {}",
                other
            ))),
        }
    }
}
