//! Transaction envelope builder
//!
//! This module turns a source account, a caller-supplied sequence number and
//! a list of intents into an unsigned transaction, and defines the
//! transaction body every later stage works on.

use crate::address::MuxedAccount;
use crate::config::{BASE_FEE, DEFAULT_TIMEOUT_SECS, MAX_OPERATIONS};
use crate::envelope::encode_envelope;
use crate::error::{Result, XdrAsmError};
use crate::fee_calculator::FeeCalculator;
use crate::operation::{BuildWarning, Intent, NullArgumentPolicy, Operation};
use crate::serialization::{
    decode_fixed_opaque, decode_i32, decode_i64, decode_u32, decode_u64, decode_var_opaque,
    encode_base64, encode_fixed_opaque, encode_i32, encode_i64, encode_u32, encode_u64,
    encode_var_opaque, helpers, ByteDeserialize, ByteSerialize,
};
use crate::soroban::SorobanTransactionData;
use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

pub const PRECOND_NONE: i32 = 0;
pub const PRECOND_TIME: i32 = 1;

pub const MEMO_NONE: i32 = 0;
pub const MEMO_TEXT: i32 = 1;
pub const MEMO_ID: i32 = 2;
pub const MEMO_HASH: i32 = 3;
pub const MEMO_RETURN: i32 = 4;
/// `string text<28>`
pub const MEMO_TEXT_LIMIT: u32 = 28;

/// Validity window in unix seconds; `max_time == 0` means no upper bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    /// Valid from now until `ttl_seconds` from now. A ttl of zero leaves the
    /// transaction without an expiry.
    pub fn with_timeout(ttl_seconds: u64) -> Result<Self> {
        if ttl_seconds == 0 {
            return Ok(Self { min_time: 0, max_time: 0 });
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| XdrAsmError::InvalidTransaction(format!("system clock: {}", e)))?
            .as_secs();
        Ok(Self {
            min_time: 0,
            max_time: now.saturating_add(ttl_seconds),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preconditions {
    None,
    Time(TimeBounds),
}

impl ByteSerialize for Preconditions {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        match self {
            Preconditions::None => encode_i32(PRECOND_NONE, writer),
            Preconditions::Time(bounds) => {
                encode_i32(PRECOND_TIME, writer)?;
                encode_u64(bounds.min_time, writer)?;
                encode_u64(bounds.max_time, writer)
            }
        }
    }
}

impl ByteDeserialize for Preconditions {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        match decode_i32(cursor)? {
            PRECOND_NONE => Ok(Preconditions::None),
            PRECOND_TIME => {
                let min_time = decode_u64(cursor)?;
                let max_time = decode_u64(cursor)?;
                Ok(Preconditions::Time(TimeBounds { min_time, max_time }))
            }
            other => Err(XdrAsmError::MalformedEnvelope(format!(
                "unsupported preconditions type {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Memo {
    #[default]
    None,
    /// Up to 28 bytes; usually UTF-8 but not required to be
    Text(Vec<u8>),
    Id(u64),
    Hash([u8; 32]),
    Return([u8; 32]),
}

impl Memo {
    pub fn text(text: &str) -> Result<Self> {
        if text.len() > MEMO_TEXT_LIMIT as usize {
            return Err(XdrAsmError::InvalidTransaction(format!(
                "memo text is {} bytes, limit is {}",
                text.len(),
                MEMO_TEXT_LIMIT
            )));
        }
        Ok(Memo::Text(text.as_bytes().to_vec()))
    }

    /// Memo text, if this is a text memo holding valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Memo::Text(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

impl ByteSerialize for Memo {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        match self {
            Memo::None => encode_i32(MEMO_NONE, writer),
            Memo::Text(text) => {
                encode_i32(MEMO_TEXT, writer)?;
                encode_var_opaque(text, MEMO_TEXT_LIMIT, writer)
            }
            Memo::Id(id) => {
                encode_i32(MEMO_ID, writer)?;
                encode_u64(*id, writer)
            }
            Memo::Hash(hash) => {
                encode_i32(MEMO_HASH, writer)?;
                encode_fixed_opaque(hash, writer)
            }
            Memo::Return(hash) => {
                encode_i32(MEMO_RETURN, writer)?;
                encode_fixed_opaque(hash, writer)
            }
        }
    }
}

impl ByteDeserialize for Memo {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        match decode_i32(cursor)? {
            MEMO_NONE => Ok(Memo::None),
            MEMO_TEXT => Ok(Memo::Text(decode_var_opaque(cursor, MEMO_TEXT_LIMIT)?)),
            MEMO_ID => Ok(Memo::Id(decode_u64(cursor)?)),
            MEMO_HASH => Ok(Memo::Hash(decode_fixed_opaque(cursor)?)),
            MEMO_RETURN => Ok(Memo::Return(decode_fixed_opaque(cursor)?)),
            other => Err(XdrAsmError::MalformedEnvelope(format!(
                "unknown memo type {}",
                other
            ))),
        }
    }
}

/// Transaction extension
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionExt {
    #[default]
    V0,
    V1(SorobanTransactionData),
}

/// The signed part of an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source_account: MuxedAccount,
    pub fee: u32,
    pub seq_num: i64,
    pub cond: Preconditions,
    pub memo: Memo,
    pub operations: Vec<Operation>,
    pub ext: TransactionExt,
}

impl Transaction {
    /// True if any operation invokes a contract
    pub fn invokes_contract(&self) -> bool {
        self.operations.iter().any(Operation::is_invoke_contract)
    }

    pub fn soroban_data(&self) -> Option<&SorobanTransactionData> {
        match &self.ext {
            TransactionExt::V0 => None,
            TransactionExt::V1(data) => Some(data),
        }
    }
}

impl ByteSerialize for Transaction {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        self.source_account.serialize_bytes(writer)?;
        encode_u32(self.fee, writer)?;
        encode_i64(self.seq_num, writer)?;
        self.cond.serialize_bytes(writer)?;
        self.memo.serialize_bytes(writer)?;
        helpers::serialize_vec(&self.operations, MAX_OPERATIONS as u32, writer)?;
        match &self.ext {
            TransactionExt::V0 => encode_i32(0, writer),
            TransactionExt::V1(data) => {
                encode_i32(1, writer)?;
                data.serialize_bytes(writer)
            }
        }
    }
}

impl ByteDeserialize for Transaction {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let source_account = MuxedAccount::deserialize_bytes(cursor)?;
        let fee = decode_u32(cursor)?;
        let seq_num = decode_i64(cursor)?;
        let cond = Preconditions::deserialize_bytes(cursor)?;
        let memo = Memo::deserialize_bytes(cursor)?;
        let operations = helpers::deserialize_vec(cursor, MAX_OPERATIONS as u32)?;
        let ext = match decode_i32(cursor)? {
            0 => TransactionExt::V0,
            1 => TransactionExt::V1(SorobanTransactionData::deserialize_bytes(cursor)?),
            other => {
                return Err(XdrAsmError::MalformedEnvelope(format!(
                    "unknown transaction extension {}",
                    other
                )))
            }
        };

        Ok(Transaction {
            source_account,
            fee,
            seq_num,
            cond,
            memo,
            operations,
            ext,
        })
    }
}

/// Freshly built transaction, not yet prepared or signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEnvelope {
    pub transaction: Transaction,
    /// Leniencies applied while building; see [`BuildWarning`]
    pub warnings: Vec<BuildWarning>,
}

impl UnsignedEnvelope {
    /// Contract invocations need footprint and authorization from simulation
    pub fn requires_simulation(&self) -> bool {
        self.transaction.invokes_contract()
    }

    /// Envelope with an empty signature list, as sent to simulation
    pub fn to_xdr_base64(&self) -> Result<String> {
        let mut bytes = Vec::new();
        encode_envelope(&self.transaction, &[], &mut bytes)?;
        Ok(encode_base64(&bytes))
    }

    /// Skip preparation; only valid when no operation invokes a contract
    pub fn into_prepared(self) -> Result<PreparedEnvelope> {
        if self.requires_simulation() && self.transaction.soroban_data().is_none() {
            return Err(XdrAsmError::PreparationRequired);
        }
        Ok(PreparedEnvelope {
            transaction: self.transaction,
            warnings: self.warnings,
        })
    }
}

/// Transaction ready to be signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEnvelope {
    pub transaction: Transaction,
    /// Carried over from the unsigned envelope
    pub warnings: Vec<BuildWarning>,
}

impl PreparedEnvelope {
    pub fn soroban_data(&self) -> Option<&SorobanTransactionData> {
        self.transaction.soroban_data()
    }
}

enum PendingOperation {
    Intent(Intent),
    Encoded(Operation),
}

/// Transaction builder with fluent API
pub struct TransactionBuilder {
    source: String,
    sequence: i64,
    base_fee: u32,
    timeout_secs: u64,
    time_bounds: Option<TimeBounds>,
    memo: Memo,
    null_arguments: NullArgumentPolicy,
    operations: Vec<PendingOperation>,
}

impl TransactionBuilder {
    /// `sequence` is used as given; the caller supplies the next sequence
    /// number for the account.
    pub fn new(source: &str, sequence: i64) -> Self {
        Self {
            source: source.to_string(),
            sequence,
            base_fee: BASE_FEE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            time_bounds: None,
            memo: Memo::None,
            null_arguments: NullArgumentPolicy::default(),
            operations: Vec::new(),
        }
    }

    /// Set the per-operation base fee in stroops
    pub fn base_fee(mut self, fee: u32) -> Self {
        self.base_fee = fee;
        self
    }

    /// Expire `ttl_seconds` after build time
    pub fn timeout(mut self, ttl_seconds: u64) -> Self {
        self.timeout_secs = ttl_seconds;
        self
    }

    /// Use explicit time bounds instead of a timeout
    pub fn time_bounds(mut self, bounds: TimeBounds) -> Self {
        self.time_bounds = Some(bounds);
        self
    }

    pub fn memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    pub fn null_arguments(mut self, policy: NullArgumentPolicy) -> Self {
        self.null_arguments = policy;
        self
    }

    /// Add an application-level intent
    pub fn add_intent(mut self, intent: impl Into<Intent>) -> Self {
        self.operations.push(PendingOperation::Intent(intent.into()));
        self
    }

    /// Add multiple intents
    pub fn add_intents(mut self, intents: Vec<Intent>) -> Self {
        self.operations
            .extend(intents.into_iter().map(PendingOperation::Intent));
        self
    }

    /// Add an already-encoded operation
    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(PendingOperation::Encoded(operation));
        self
    }

    /// Validate, encode and assemble the unsigned transaction
    pub fn build(self) -> Result<UnsignedEnvelope> {
        if self.operations.is_empty() {
            return Err(XdrAsmError::EmptyTransaction);
        }
        if self.operations.len() > MAX_OPERATIONS {
            return Err(XdrAsmError::InvalidTransaction(format!(
                "{} operations, limit is {}",
                self.operations.len(),
                MAX_OPERATIONS
            )));
        }

        let source_account = MuxedAccount::from_strkey(&self.source)?;

        let mut warnings = Vec::new();
        let operations = self
            .operations
            .into_iter()
            .enumerate()
            .map(|(index, pending)| match pending {
                PendingOperation::Intent(intent) => {
                    intent.encode(index, self.null_arguments, &mut warnings)
                }
                PendingOperation::Encoded(operation) => Ok(operation),
            })
            .collect::<Result<Vec<_>>>()?;

        // the network only accepts a contract invocation as the sole operation
        if operations.len() > 1 && operations.iter().any(Operation::is_invoke_contract) {
            return Err(XdrAsmError::InvalidTransaction(
                "a contract invocation must be the only operation in its transaction".to_string(),
            ));
        }

        let fee = FeeCalculator::with_base_fee(self.base_fee).inclusion_fee(operations.len())?;
        let bounds = match self.time_bounds {
            Some(bounds) => bounds,
            None => TimeBounds::with_timeout(self.timeout_secs)?,
        };

        tracing::debug!(
            source = %source_account.account(),
            sequence = self.sequence,
            fee,
            operations = operations.len(),
            max_time = bounds.max_time,
            "built unsigned transaction"
        );

        Ok(UnsignedEnvelope {
            transaction: Transaction {
                source_account,
                fee,
                seq_num: self.sequence,
                cond: Preconditions::Time(bounds),
                memo: self.memo,
                operations,
                ext: TransactionExt::V0,
            },
            warnings,
        })
    }
}

/// Build an unsigned envelope in one call.
///
/// `fee` is the per-operation base fee; `ttl_seconds` sets the expiry.
pub fn build(
    source: &str,
    sequence: i64,
    fee: u32,
    operations: Vec<Intent>,
    ttl_seconds: u64,
) -> Result<UnsignedEnvelope> {
    TransactionBuilder::new(source, sequence)
        .base_fee(fee)
        .timeout(ttl_seconds)
        .add_intents(operations)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AccountId, ContractId};
    use crate::operation::{Asset, ContractCall, OperationBody};
    use crate::value::{ArgType, ArgValue, TypedValue};

    fn source() -> String {
        AccountId([1u8; 32]).to_strkey()
    }

    fn pay(amount: i64) -> Intent {
        Intent::payment(&AccountId([2u8; 32]).to_strkey(), Asset::Native, amount)
    }

    #[test]
    fn test_empty_transaction_rejected() {
        for (fee, sequence) in [(0, 0), (100, 1), (u32::MAX, i64::MAX), (1, -1)] {
            assert!(matches!(
                build(&source(), sequence, fee, Vec::new(), 30),
                Err(XdrAsmError::EmptyTransaction)
            ));
        }
    }

    #[test]
    fn test_transaction_builder() {
        let envelope = TransactionBuilder::new(&source(), 42)
            .base_fee(200)
            .memo(Memo::text("rent").unwrap())
            .add_intent(pay(5_000_000))
            .add_intent(pay(7))
            .build()
            .unwrap();

        let tx = &envelope.transaction;
        assert_eq!(tx.seq_num, 42);
        assert_eq!(tx.fee, 400);
        assert_eq!(tx.operations.len(), 2);
        assert_eq!(tx.memo, Memo::Text(b"rent".to_vec()));
        assert_eq!(tx.memo.as_text(), Some("rent"));
        assert!(!envelope.requires_simulation());
        assert!(envelope.warnings.is_empty());
    }

    #[test]
    fn test_expiry_is_ttl_from_now() {
        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let envelope = build(&source(), 1, 100, vec![pay(1)], 300).unwrap();
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        let Preconditions::Time(bounds) = envelope.transaction.cond else {
            panic!("expected time bounds");
        };
        assert_eq!(bounds.min_time, 0);
        assert!(bounds.max_time >= before + 300 && bounds.max_time <= after + 300);
    }

    #[test]
    fn test_zero_timeout_has_no_upper_bound() {
        let envelope = build(&source(), 1, 100, vec![pay(1)], 0).unwrap();
        assert_eq!(
            envelope.transaction.cond,
            Preconditions::Time(TimeBounds { min_time: 0, max_time: 0 })
        );
    }

    #[test]
    fn test_invalid_source_address() {
        assert!(matches!(
            build("GBADSOURCE", 1, 100, vec![pay(1)], 30),
            Err(XdrAsmError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_too_many_operations() {
        let intents = (0..=MAX_OPERATIONS).map(|_| pay(1)).collect();
        assert!(matches!(
            build(&source(), 1, 100, intents, 30),
            Err(XdrAsmError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_memo_text_limit() {
        assert!(Memo::text(&"m".repeat(28)).is_ok());
        assert!(Memo::text(&"m".repeat(29)).is_err());
    }

    #[test]
    fn test_contract_call_requires_preparation() {
        let call = ContractCall::new(&ContractId([9u8; 32]).to_strkey(), "increment")
            .arg("by", ArgType::U32, 1u32)
            .arg("note", ArgType::String, ArgValue::Null);
        let envelope = TransactionBuilder::new(&source(), 7)
            .add_intent(call)
            .build()
            .unwrap();

        assert!(envelope.requires_simulation());
        assert_eq!(envelope.warnings.len(), 1);
        let OperationBody::InvokeContract(invoke) = &envelope.transaction.operations[0].body else {
            panic!("expected invocation");
        };
        assert_eq!(invoke.args, vec![TypedValue::U32(1)]);
        assert!(matches!(
            envelope.into_prepared(),
            Err(XdrAsmError::PreparationRequired)
        ));
    }

    #[test]
    fn test_transaction_round_trip() {
        let envelope = TransactionBuilder::new(&source(), 99)
            .memo(Memo::Id(12))
            .time_bounds(TimeBounds { min_time: 10, max_time: 20 })
            .add_intent(pay(3))
            .build()
            .unwrap();
        let bytes = envelope.transaction.to_xdr().unwrap();
        assert_eq!(Transaction::from_xdr(&bytes).unwrap(), envelope.transaction);
    }

    #[test]
    fn test_contract_call_must_be_alone() {
        let contract = ContractId([9u8; 32]).to_strkey();
        let call = || ContractCall::new(&contract, "bump").arg("by", ArgType::U32, 1u32);

        let mixed = TransactionBuilder::new(&source(), 1)
            .add_intent(pay(1))
            .add_intent(call())
            .build();
        assert!(matches!(mixed, Err(XdrAsmError::InvalidTransaction(_))));

        let doubled = TransactionBuilder::new(&source(), 1)
            .add_intent(call())
            .add_intent(call())
            .build();
        assert!(matches!(doubled, Err(XdrAsmError::InvalidTransaction(_))));

        assert!(TransactionBuilder::new(&source(), 1).add_intent(call()).build().is_ok());
    }

    #[test]
    fn test_non_utf8_memo_round_trip() {
        let mut envelope = build(&source(), 5, 100, vec![pay(1)], 0).unwrap();
        envelope.transaction.memo = Memo::Text(vec![0xff, 0xfe]);

        let bytes = envelope.transaction.to_xdr().unwrap();
        let decoded = Transaction::from_xdr(&bytes).unwrap();
        assert_eq!(decoded.memo, Memo::Text(vec![0xff, 0xfe]));
        assert_eq!(decoded.memo.as_text(), None);
        assert_eq!(decoded.to_xdr().unwrap(), bytes);
    }
}
