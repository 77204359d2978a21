//! Signed envelope serialization and validation
//!
//! A `TransactionEnvelope` on the wire is the envelope type discriminant
//! followed by the transaction and its decorated signatures. Only
//! `ENVELOPE_TYPE_TX` envelopes are produced or accepted.

use crate::address::AccountId;
use crate::config::{network_id, MAX_SIGNATURES};
use crate::error::{Result, XdrAsmError};
use crate::serialization::{
    decode_base64, decode_i32, encode_i32, expect_end, helpers, ByteDeserialize,
    ByteSerialize,
};
use crate::signing::{signature_hint, signature_payload, verify, DecoratedSignature};
use crate::transaction::Transaction;
use std::io::Cursor;

/// `EnvelopeType::ENVELOPE_TYPE_TX`
pub const ENVELOPE_TYPE_TX: i32 = 2;

/// Write a v1 transaction envelope
pub(crate) fn encode_envelope(
    transaction: &Transaction,
    signatures: &[DecoratedSignature],
    writer: &mut Vec<u8>,
) -> Result<()> {
    encode_i32(ENVELOPE_TYPE_TX, writer)?;
    transaction.serialize_bytes(writer)?;
    helpers::serialize_vec(signatures, MAX_SIGNATURES as u32, writer)
}

/// Transaction with at least one signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub transaction: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

impl SignedEnvelope {
    /// True if one of the signatures with a matching hint was made by
    /// `public_key` over this transaction for the given network.
    pub fn verify_signature(&self, public_key: &AccountId, network_passphrase: &str) -> Result<bool> {
        let payload = signature_payload(&self.transaction, &network_id(network_passphrase))?;
        let hint = signature_hint(public_key);
        Ok(self
            .signatures
            .iter()
            .filter(|decorated| decorated.hint == hint)
            .any(|decorated| verify(public_key, &payload, &decorated.signature)))
    }

    /// Hex transaction hash, as used to look the transaction up once submitted
    pub fn hash(&self, network_passphrase: &str) -> Result<String> {
        let payload = signature_payload(&self.transaction, &network_id(network_passphrase))?;
        Ok(hex::encode(payload))
    }
}

impl ByteSerialize for SignedEnvelope {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        encode_envelope(&self.transaction, &self.signatures, writer)
    }
}

impl ByteDeserialize for SignedEnvelope {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        match decode_i32(cursor)? {
            ENVELOPE_TYPE_TX => {}
            other => {
                return Err(XdrAsmError::MalformedEnvelope(format!(
                    "unsupported envelope type {}",
                    other
                )))
            }
        }
        let transaction = Transaction::deserialize_bytes(cursor)?;
        let signatures = helpers::deserialize_vec(cursor, MAX_SIGNATURES as u32)?;
        Ok(SignedEnvelope {
            transaction,
            signatures,
        })
    }
}

/// Canonical XDR of a signed envelope, base64-encoded for transport
pub fn serialize(envelope: &SignedEnvelope) -> Result<String> {
    if envelope.signatures.is_empty() {
        return Err(XdrAsmError::Unsigned);
    }
    let encoded = envelope.to_xdr_base64()?;
    tracing::debug!(
        signatures = envelope.signatures.len(),
        length = encoded.len(),
        "serialized envelope"
    );
    Ok(encoded)
}

/// Parse a base64 envelope and require at least one signature
pub fn deserialize(text: &str) -> Result<SignedEnvelope> {
    let bytes = decode_base64(text)?;
    let mut cursor = Cursor::new(bytes.as_slice());
    let envelope = SignedEnvelope::deserialize_bytes(&mut cursor)
        .and_then(|envelope| expect_end(&cursor).map(|_| envelope))
        .map_err(XdrAsmError::into_malformed)?;

    if envelope.signatures.is_empty() {
        return Err(XdrAsmError::Unsigned);
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PUBLIC_NETWORK_PASSPHRASE, TESTNET_PASSPHRASE};
    use crate::serialization::encode_base64;
    use crate::operation::{Asset, Intent};
    use crate::signing::{sign, sign_with_keypair, Keypair};
    use crate::transaction::{build, Memo, TransactionBuilder, UnsignedEnvelope};
    use sha2::{Digest, Sha256};
    use stellar_xdr::curr::{
        Hash, Limits, ReadXdr, TransactionSignaturePayload,
        TransactionSignaturePayloadTaggedTransaction, WriteXdr,
    };

    fn payment_envelope(source: &Keypair) -> UnsignedEnvelope {
        let destination = AccountId([2u8; 32]).to_strkey();
        TransactionBuilder::new(&source.public_key().to_strkey(), 1_234)
            .memo(Memo::text("invoice 7").unwrap())
            .add_intent(Intent::payment(&destination, Asset::Native, 10_000_000i64))
            .build()
            .unwrap()
    }

    #[test]
    fn test_signed_round_trip() {
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let signed = sign(payment_envelope(&keypair), &keypair.secret_strkey(), TESTNET_PASSPHRASE).unwrap();

        let encoded = serialize(&signed).unwrap();
        let decoded = deserialize(&encoded).unwrap();
        assert_eq!(decoded, signed);
        assert_eq!(serialize(&decoded).unwrap(), encoded);
        assert!(decoded.verify_signature(&keypair.public_key(), TESTNET_PASSPHRASE).unwrap());
    }

    #[test]
    fn test_unsigned_envelope_rejected() {
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let unsigned = payment_envelope(&keypair).to_xdr_base64().unwrap();
        assert!(matches!(deserialize(&unsigned), Err(XdrAsmError::Unsigned)));
    }

    #[test]
    fn test_two_signers_both_verify() {
        let first = Keypair::from_seed(&[1u8; 32]);
        let second = Keypair::from_seed(&[2u8; 32]);

        let signed = sign_with_keypair(payment_envelope(&first), &first, TESTNET_PASSPHRASE).unwrap();
        let signed = sign_with_keypair(signed, &second, TESTNET_PASSPHRASE).unwrap();

        let decoded = deserialize(&serialize(&signed).unwrap()).unwrap();
        assert_eq!(decoded.signatures.len(), 2);
        assert!(decoded.verify_signature(&first.public_key(), TESTNET_PASSPHRASE).unwrap());
        assert!(decoded.verify_signature(&second.public_key(), TESTNET_PASSPHRASE).unwrap());
        assert!(!decoded
            .verify_signature(&Keypair::from_seed(&[3u8; 32]).public_key(), TESTNET_PASSPHRASE)
            .unwrap());
    }

    #[test]
    fn test_malformed_input() {
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let signed = sign_with_keypair(payment_envelope(&keypair), &keypair, TESTNET_PASSPHRASE).unwrap();
        let bytes = signed.to_xdr().unwrap();

        let truncated = encode_base64(&bytes[..bytes.len() - 8]);
        let mut trailing = bytes.clone();
        trailing.extend_from_slice(&[0, 0, 0, 0]);
        let mut wrong_type = bytes.clone();
        wrong_type[3] = 5;

        for input in [
            "not base64 at all!".to_string(),
            truncated,
            encode_base64(&trailing),
            encode_base64(&wrong_type),
            String::new(),
        ] {
            assert!(
                matches!(deserialize(&input), Err(XdrAsmError::MalformedEnvelope(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_serialize_requires_signature() {
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let envelope = SignedEnvelope {
            transaction: payment_envelope(&keypair).transaction,
            signatures: Vec::new(),
        };
        assert!(matches!(serialize(&envelope), Err(XdrAsmError::Unsigned)));
        assert!(envelope.to_xdr_base64().is_ok());
    }

    #[test]
    fn test_hash_is_network_specific() {
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let source = keypair.public_key().to_strkey();
        let destination = AccountId([5u8; 32]).to_strkey();
        let unsigned = build(&source, 2, 100, vec![Intent::payment(&destination, Asset::Native, 1i64)], 0).unwrap();
        let signed = sign_with_keypair(unsigned, &keypair, TESTNET_PASSPHRASE).unwrap();

        let testnet = signed.hash(TESTNET_PASSPHRASE).unwrap();
        assert_eq!(testnet.len(), 64);
        assert_ne!(testnet, signed.hash(PUBLIC_NETWORK_PASSPHRASE).unwrap());
    }

    #[test]
    fn test_payment_matches_reference_codec() {
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let mut unsigned = payment_envelope(&keypair);
        unsigned.transaction.memo = Memo::Text(vec![0xff, 0xfe]);
        let signed = sign_with_keypair(unsigned, &keypair, TESTNET_PASSPHRASE).unwrap();
        let encoded = serialize(&signed).unwrap();

        let reference =
            stellar_xdr::curr::TransactionEnvelope::from_xdr_base64(&encoded, Limits::none()).unwrap();
        assert_eq!(reference.to_xdr_base64(Limits::none()).unwrap(), encoded);

        let stellar_xdr::curr::TransactionEnvelope::Tx(v1) = &reference else {
            panic!("expected a v1 envelope");
        };
        assert_eq!(v1.tx.fee, signed.transaction.fee);
        assert_eq!(v1.tx.seq_num.0, 1_234);
        assert_eq!(v1.signatures.len(), 1);
        match &v1.tx.memo {
            stellar_xdr::curr::Memo::Text(text) => assert_eq!(Vec::<u8>::from(text.clone()), vec![0xff, 0xfe]),
            other => panic!("unexpected memo {:?}", other),
        }

        let payload = TransactionSignaturePayload {
            network_id: Hash(network_id(TESTNET_PASSPHRASE)),
            tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(v1.tx.clone()),
        };
        let expected: [u8; 32] = Sha256::digest(payload.to_xdr(Limits::none()).unwrap()).into();
        assert_eq!(signed.hash(TESTNET_PASSPHRASE).unwrap(), hex::encode(expected));

        // a memo that is not UTF-8 is still a valid envelope
        assert_eq!(deserialize(&encoded).unwrap(), signed);
    }
}
