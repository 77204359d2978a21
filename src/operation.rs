//! Operation encoding and application-level intents
//!
//! [`Operation`] is the wire-level form. [`Intent`] and [`ContractCall`] are
//! what the application hands in: strkeys and loosely typed values that are
//! validated and encoded when the transaction is built.

use crate::address::{AccountId, ContractId, MuxedAccount, ScAddress};
use crate::error::{Result, XdrAsmError};
use crate::serialization::{
    decode_fixed_opaque, decode_i32, decode_i64, decode_string, encode_fixed_opaque, encode_i32,
    encode_i64, encode_string, helpers, ByteDeserialize, ByteSerialize,
};
use crate::soroban::AuthorizationEntry;
use crate::value::{encode, validate_symbol, ArgType, ArgValue, TypedValue, SCSYMBOL_LIMIT};
use std::io::Cursor;

pub const ASSET_TYPE_NATIVE: i32 = 0;
pub const ASSET_TYPE_CREDIT_ALPHANUM4: i32 = 1;
pub const ASSET_TYPE_CREDIT_ALPHANUM12: i32 = 2;

pub const OPERATION_TYPE_PAYMENT: i32 = 1;
pub const OPERATION_TYPE_INVOKE_HOST_FUNCTION: i32 = 24;
pub const HOST_FUNCTION_TYPE_INVOKE_CONTRACT: i32 = 0;

const UNBOUNDED: u32 = u32::MAX;

/// Asset being moved by a payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Native,
    CreditAlphanum4 { code: [u8; 4], issuer: AccountId },
    CreditAlphanum12 { code: [u8; 12], issuer: AccountId },
}

impl Asset {
    /// Issued asset from a 1-12 character alphanumeric code and a `G…` issuer
    pub fn credit(code: &str, issuer: &str) -> Result<Self> {
        if code.is_empty() || code.len() > 12 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(XdrAsmError::InvalidTransaction(format!(
                "invalid asset code {:?}",
                code
            )));
        }
        let issuer = AccountId::from_strkey(issuer)?;

        if code.len() <= 4 {
            let mut padded = [0u8; 4];
            padded[..code.len()].copy_from_slice(code.as_bytes());
            Ok(Asset::CreditAlphanum4 { code: padded, issuer })
        } else {
            let mut padded = [0u8; 12];
            padded[..code.len()].copy_from_slice(code.as_bytes());
            Ok(Asset::CreditAlphanum12 { code: padded, issuer })
        }
    }

    /// Asset code without the zero padding; `"native"` for the native asset
    pub fn code(&self) -> String {
        let raw: &[u8] = match self {
            Asset::Native => return "native".to_string(),
            Asset::CreditAlphanum4 { code, .. } => code,
            Asset::CreditAlphanum12 { code, .. } => code,
        };
        raw.iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }
}

impl ByteSerialize for Asset {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        match self {
            Asset::Native => encode_i32(ASSET_TYPE_NATIVE, writer),
            Asset::CreditAlphanum4 { code, issuer } => {
                encode_i32(ASSET_TYPE_CREDIT_ALPHANUM4, writer)?;
                encode_fixed_opaque(code, writer)?;
                issuer.serialize_bytes(writer)
            }
            Asset::CreditAlphanum12 { code, issuer } => {
                encode_i32(ASSET_TYPE_CREDIT_ALPHANUM12, writer)?;
                encode_fixed_opaque(code, writer)?;
                issuer.serialize_bytes(writer)
            }
        }
    }
}

impl ByteDeserialize for Asset {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        match decode_i32(cursor)? {
            ASSET_TYPE_NATIVE => Ok(Asset::Native),
            ASSET_TYPE_CREDIT_ALPHANUM4 => {
                let code = decode_fixed_opaque(cursor)?;
                let issuer = AccountId::deserialize_bytes(cursor)?;
                Ok(Asset::CreditAlphanum4 { code, issuer })
            }
            ASSET_TYPE_CREDIT_ALPHANUM12 => {
                let code = decode_fixed_opaque(cursor)?;
                let issuer = AccountId::deserialize_bytes(cursor)?;
                Ok(Asset::CreditAlphanum12 { code, issuer })
            }
            other => Err(XdrAsmError::MalformedEnvelope(format!(
                "unknown asset type {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub destination: MuxedAccount,
    pub asset: Asset,
    /// Amount in the asset's smallest unit (stroops for native)
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeContract {
    pub contract: ContractId,
    pub function: String,
    pub args: Vec<TypedValue>,
    /// Filled in from simulation when left empty
    pub auth: Vec<AuthorizationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBody {
    Payment(Payment),
    InvokeContract(InvokeContract),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Overrides the transaction source for this operation
    pub source_account: Option<MuxedAccount>,
    pub body: OperationBody,
}

impl Operation {
    pub fn payment(destination: MuxedAccount, asset: Asset, amount: i64) -> Self {
        Self {
            source_account: None,
            body: OperationBody::Payment(Payment { destination, asset, amount }),
        }
    }

    pub fn invoke_contract(contract: ContractId, function: &str, args: Vec<TypedValue>) -> Result<Self> {
        validate_symbol(function)?;
        Ok(Self {
            source_account: None,
            body: OperationBody::InvokeContract(InvokeContract {
                contract,
                function: function.to_string(),
                args,
                auth: Vec::new(),
            }),
        })
    }

    pub fn is_invoke_contract(&self) -> bool {
        matches!(self.body, OperationBody::InvokeContract(_))
    }
}

impl ByteSerialize for Operation {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        helpers::serialize_option(self.source_account.as_ref(), writer)?;
        match &self.body {
            OperationBody::Payment(payment) => {
                encode_i32(OPERATION_TYPE_PAYMENT, writer)?;
                payment.destination.serialize_bytes(writer)?;
                payment.asset.serialize_bytes(writer)?;
                encode_i64(payment.amount, writer)
            }
            OperationBody::InvokeContract(invoke) => {
                encode_i32(OPERATION_TYPE_INVOKE_HOST_FUNCTION, writer)?;
                encode_i32(HOST_FUNCTION_TYPE_INVOKE_CONTRACT, writer)?;
                ScAddress::Contract(invoke.contract).serialize_bytes(writer)?;
                encode_string(&invoke.function, SCSYMBOL_LIMIT, writer)?;
                helpers::serialize_vec(&invoke.args, UNBOUNDED, writer)?;
                helpers::serialize_vec(&invoke.auth, UNBOUNDED, writer)
            }
        }
    }
}

impl ByteDeserialize for Operation {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let source_account = helpers::deserialize_option(cursor)?;

        let body = match decode_i32(cursor)? {
            OPERATION_TYPE_PAYMENT => {
                let destination = MuxedAccount::deserialize_bytes(cursor)?;
                let asset = Asset::deserialize_bytes(cursor)?;
                let amount = decode_i64(cursor)?;
                OperationBody::Payment(Payment { destination, asset, amount })
            }
            OPERATION_TYPE_INVOKE_HOST_FUNCTION => {
                match decode_i32(cursor)? {
                    HOST_FUNCTION_TYPE_INVOKE_CONTRACT => {}
                    other => {
                        return Err(XdrAsmError::MalformedEnvelope(format!(
                            "unsupported host function type {}",
                            other
                        )))
                    }
                }
                let contract = match ScAddress::deserialize_bytes(cursor)? {
                    ScAddress::Contract(id) => id,
                    ScAddress::Account(_) => {
                        return Err(XdrAsmError::MalformedEnvelope(
                            "contract invocation targets an account".to_string(),
                        ))
                    }
                };
                let function = decode_string(cursor, SCSYMBOL_LIMIT)?;
                validate_symbol(&function).map_err(XdrAsmError::into_malformed)?;
                let args = helpers::deserialize_vec(cursor, UNBOUNDED)?;
                let auth = helpers::deserialize_vec(cursor, UNBOUNDED)?;
                OperationBody::InvokeContract(InvokeContract { contract, function, args, auth })
            }
            other => {
                return Err(XdrAsmError::MalformedEnvelope(format!(
                    "unsupported operation type {}",
                    other
                )))
            }
        };

        Ok(Operation { source_account, body })
    }
}

/// What to do with contract arguments whose value is null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullArgumentPolicy {
    /// Leave the argument out and record a [`BuildWarning`]
    #[default]
    Drop,
    /// Fail with `MissingArgument`
    Reject,
}

/// Non-fatal findings surfaced to the caller with the built envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// A null contract argument was left out of the call. Intentionally
    /// omitted and forgotten arguments look the same here, so the caller
    /// should check the list.
    DroppedNullArgument {
        operation: usize,
        function: String,
        argument: String,
    },
}

/// One named, typed contract argument
#[derive(Debug, Clone, PartialEq)]
pub struct ContractArg {
    pub name: String,
    pub arg_type: ArgType,
    pub value: ArgValue,
}

/// Contract call intent with builder pattern
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    contract: String,
    function: String,
    args: Vec<ContractArg>,
}

impl ContractCall {
    pub fn new(contract: &str, function: &str) -> Self {
        Self {
            contract: contract.to_string(),
            function: function.to_string(),
            args: Vec::new(),
        }
    }

    /// Append an argument; order is the order the function expects
    pub fn arg(mut self, name: &str, arg_type: ArgType, value: impl Into<ArgValue>) -> Self {
        self.args.push(ContractArg {
            name: name.to_string(),
            arg_type,
            value: value.into(),
        });
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn args(&self) -> &[ContractArg] {
        &self.args
    }

    /// Validate and encode into a wire operation
    pub fn encode(
        &self,
        index: usize,
        policy: NullArgumentPolicy,
        warnings: &mut Vec<BuildWarning>,
    ) -> Result<Operation> {
        let contract = ContractId::from_strkey(&self.contract)?;

        let mut args = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            if arg.value.is_null() && arg.arg_type != ArgType::Void {
                if policy == NullArgumentPolicy::Reject {
                    return Err(XdrAsmError::MissingArgument(arg.name.clone()));
                }
                tracing::warn!(
                    operation = index,
                    function = %self.function,
                    argument = %arg.name,
                    "dropping null contract argument"
                );
                warnings.push(BuildWarning::DroppedNullArgument {
                    operation: index,
                    function: self.function.clone(),
                    argument: arg.name.clone(),
                });
                continue;
            }
            args.push(encode(&arg.value, &arg.arg_type).map_err(|e| e.for_argument(&arg.name))?);
        }

        Operation::invoke_contract(contract, &self.function, args)
    }
}

/// Application-level operation intent
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Payment {
        destination: String,
        asset: Asset,
        amount: ArgValue,
    },
    Invoke(ContractCall),
}

impl Intent {
    pub fn payment(destination: &str, asset: Asset, amount: impl Into<ArgValue>) -> Self {
        Intent::Payment {
            destination: destination.to_string(),
            asset,
            amount: amount.into(),
        }
    }

    pub fn encode(
        &self,
        index: usize,
        policy: NullArgumentPolicy,
        warnings: &mut Vec<BuildWarning>,
    ) -> Result<Operation> {
        match self {
            Intent::Payment { destination, asset, amount } => {
                let destination = MuxedAccount::from_strkey(destination)?;
                let amount = payment_amount(amount).map_err(|e| e.for_argument("amount"))?;
                Ok(Operation::payment(destination, asset.clone(), amount))
            }
            Intent::Invoke(call) => call.encode(index, policy, warnings),
        }
    }
}

impl From<ContractCall> for Intent {
    fn from(call: ContractCall) -> Self {
        Intent::Invoke(call)
    }
}

/// Payment amounts go through the same integer coercion as contract
/// arguments and must then be a positive `i64`.
fn payment_amount(value: &ArgValue) -> Result<i64> {
    let wide = encode(value, &ArgType::I128)?
        .as_i128()
        .ok_or_else(|| XdrAsmError::InvalidTransaction("amount is not an integer".to_string()))?;

    i64::try_from(wide)
        .ok()
        .filter(|&amount| amount > 0)
        .ok_or_else(|| XdrAsmError::IntegerRange {
            value: wide.to_string(),
            target: "positive i64",
        })
}
