//! Transaction signing
//!
//! The signed payload is the SHA-256 of the network id, the envelope type
//! and the transaction XDR, so a signature is only valid on the network it
//! was produced for.

use crate::address::AccountId;
use crate::config::{network_id, MAX_SIGNATURES};
use crate::envelope::{SignedEnvelope, ENVELOPE_TYPE_TX};
use crate::error::{Result, XdrAsmError};
use crate::serialization::{
    decode_fixed_opaque, decode_var_opaque, encode_fixed_opaque, encode_i32, encode_var_opaque,
    ByteDeserialize, ByteSerialize,
};
use crate::transaction::{PreparedEnvelope, Transaction, UnsignedEnvelope};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Cursor;
use stellar_strkey::{ed25519, Strkey};

/// `Signature signature<64>`
const SIGNATURE_LIMIT: u32 = 64;

/// Ed25519 signing keypair
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Decode an `S…` secret seed
    pub fn from_secret(secret: &str) -> Result<Self> {
        match Strkey::from_string(secret.trim()) {
            Ok(Strkey::PrivateKeyEd25519(key)) => Ok(Self::from_seed(&key.0)),
            Ok(_) => Err(XdrAsmError::InvalidSecretKey(
                "strkey is not an ed25519 secret seed".to_string(),
            )),
            Err(e) => Err(XdrAsmError::InvalidSecretKey(format!("{:?}", e))),
        }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn secret_strkey(&self) -> String {
        Strkey::PrivateKeyEd25519(ed25519::PrivateKey(self.signing_key.to_bytes())).to_string()
    }

    pub fn public_key(&self) -> AccountId {
        AccountId(self.signing_key.verifying_key().to_bytes())
    }

    /// Last four bytes of the public key
    pub fn hint(&self) -> [u8; 4] {
        signature_hint(&self.public_key())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Sign and attach this key's hint
    pub fn sign_decorated(&self, message: &[u8]) -> DecoratedSignature {
        DecoratedSignature {
            hint: self.hint(),
            signature: self.sign(message).to_vec(),
        }
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify(&self.public_key(), message, signature)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key().to_strkey())
            .finish()
    }
}

pub fn signature_hint(public_key: &AccountId) -> [u8; 4] {
    let bytes = public_key.as_bytes();
    [bytes[28], bytes[29], bytes[30], bytes[31]]
}

/// Check a detached ed25519 signature against an account key
pub fn verify(public_key: &AccountId, message: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &signature).is_ok()
}

/// Signature plus the hint identifying which key produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    pub hint: [u8; 4],
    pub signature: Vec<u8>,
}

impl ByteSerialize for DecoratedSignature {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        encode_fixed_opaque(&self.hint, writer)?;
        encode_var_opaque(&self.signature, SIGNATURE_LIMIT, writer)
    }
}

impl ByteDeserialize for DecoratedSignature {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let hint = decode_fixed_opaque(cursor)?;
        let signature = decode_var_opaque(cursor, SIGNATURE_LIMIT)?;
        Ok(DecoratedSignature { hint, signature })
    }
}

/// Hash that signers sign: `SHA256(network_id ‖ ENVELOPE_TYPE_TX ‖ tx)`
pub fn signature_payload(transaction: &Transaction, network_id: &[u8; 32]) -> Result<[u8; 32]> {
    let mut tagged = Vec::new();
    encode_i32(ENVELOPE_TYPE_TX, &mut tagged)?;
    transaction.serialize_bytes(&mut tagged)?;

    let mut hasher = Sha256::new();
    hasher.update(network_id);
    hasher.update(&tagged);
    Ok(hasher.finalize().into())
}

/// Envelopes that can take another signature
pub trait Signable {
    fn into_parts(self) -> Result<(Transaction, Vec<DecoratedSignature>)>;
}

impl Signable for PreparedEnvelope {
    fn into_parts(self) -> Result<(Transaction, Vec<DecoratedSignature>)> {
        Ok((self.transaction, Vec::new()))
    }
}

/// Payment-only envelopes can be signed without preparation; contract
/// invocations fail with `PreparationRequired`.
impl Signable for UnsignedEnvelope {
    fn into_parts(self) -> Result<(Transaction, Vec<DecoratedSignature>)> {
        self.into_prepared()?.into_parts()
    }
}

impl Signable for SignedEnvelope {
    fn into_parts(self) -> Result<(Transaction, Vec<DecoratedSignature>)> {
        Ok((self.transaction, self.signatures))
    }
}

/// Sign with an `S…` secret seed for the network named by its passphrase.
///
/// The keypair is dropped before returning. Call again with another secret
/// to add a co-signature.
pub fn sign<E: Signable>(envelope: E, secret: &str, network_passphrase: &str) -> Result<SignedEnvelope> {
    let keypair = Keypair::from_secret(secret)?;
    sign_with_keypair(envelope, &keypair, network_passphrase)
}

pub fn sign_with_keypair<E: Signable>(
    envelope: E,
    keypair: &Keypair,
    network_passphrase: &str,
) -> Result<SignedEnvelope> {
    let (transaction, mut signatures) = envelope.into_parts()?;
    if signatures.len() >= MAX_SIGNATURES {
        return Err(XdrAsmError::TooManySignatures { max: MAX_SIGNATURES });
    }

    let payload = signature_payload(&transaction, &network_id(network_passphrase))?;
    signatures.push(keypair.sign_decorated(&payload));

    tracing::debug!(
        signer = %keypair.public_key(),
        signatures = signatures.len(),
        "signed transaction"
    );

    Ok(SignedEnvelope {
        transaction,
        signatures,
    })
}
