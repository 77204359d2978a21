//! Typed contract values
//!
//! [`TypedValue`] is the subset of the ledger's `SCVal` union this crate
//! produces. [`encode`] turns a loosely typed application value plus a
//! declared [`ArgType`] into one, failing instead of guessing.

use crate::address::{AddressKind, ScAddress};
use crate::error::{Result, XdrAsmError};
use crate::int128::{parse_i128, reassemble_i128, split_i128};
use crate::payload::normalize_bytes;
use crate::serialization::{
    decode_bool, decode_i32, decode_i64, decode_len, decode_string, decode_u32, decode_u64,
    decode_var_opaque, encode_bool, encode_i32, encode_i64, encode_len, encode_string,
    encode_u32, encode_u64, encode_var_opaque, ByteDeserialize, ByteSerialize,
};
use std::cmp::Ordering;
use std::io::Cursor;

pub const SCV_BOOL: i32 = 0;
pub const SCV_VOID: i32 = 1;
pub const SCV_U32: i32 = 3;
pub const SCV_U64: i32 = 5;
pub const SCV_I128: i32 = 10;
pub const SCV_BYTES: i32 = 13;
pub const SCV_STRING: i32 = 14;
pub const SCV_SYMBOL: i32 = 15;
pub const SCV_VEC: i32 = 16;
pub const SCV_MAP: i32 = 17;
pub const SCV_ADDRESS: i32 = 18;

/// `SCSymbol` is `string<32>`
pub const SCSYMBOL_LIMIT: u32 = 32;
/// `SCVec` / `SCBytes` / `SCString` are unbounded on the wire; the network
/// enforces its own limits.
const UNBOUNDED: u32 = u32::MAX;
/// Nesting limit for `Vec` values when decoding
const MAX_DEPTH: usize = 32;

/// Contract argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Bool(bool),
    Void,
    U32(u32),
    U64(u64),
    I128 { hi: i64, lo: u64 },
    Bytes(Vec<u8>),
    /// `SCString` is a byte string; it is not required to be UTF-8
    String(Vec<u8>),
    Symbol(String),
    Vec(Vec<TypedValue>),
    /// Entries in the order they are written; see [`TypedValue::map`]
    Map(Vec<(TypedValue, TypedValue)>),
    Address(ScAddress),
}

impl TypedValue {
    pub fn i128(value: i128) -> Self {
        let (hi, lo) = split_i128(value);
        TypedValue::I128 { hi, lo }
    }

    pub fn string(text: &str) -> Self {
        TypedValue::String(text.as_bytes().to_vec())
    }

    /// Map with entries sorted into the ledger's key order. Duplicate keys
    /// are rejected.
    pub fn map(mut entries: Vec<(TypedValue, TypedValue)>) -> Result<Self> {
        entries.sort_by(|a, b| canonical_cmp(&a.0, &b.0));
        if entries
            .windows(2)
            .any(|pair| canonical_cmp(&pair[0].0, &pair[1].0) == Ordering::Equal)
        {
            return Err(XdrAsmError::InvalidTransaction("duplicate map key".to_string()));
        }
        Ok(TypedValue::Map(entries))
    }

    /// Validated symbol
    pub fn symbol(name: &str) -> Result<Self> {
        validate_symbol(name)?;
        Ok(TypedValue::Symbol(name.to_string()))
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            TypedValue::I128 { hi, lo } => Some(reassemble_i128(*hi, *lo)),
            _ => None,
        }
    }

    fn discriminant(&self) -> i32 {
        match self {
            TypedValue::Bool(_) => SCV_BOOL,
            TypedValue::Void => SCV_VOID,
            TypedValue::U32(_) => SCV_U32,
            TypedValue::U64(_) => SCV_U64,
            TypedValue::I128 { .. } => SCV_I128,
            TypedValue::Bytes(_) => SCV_BYTES,
            TypedValue::String(_) => SCV_STRING,
            TypedValue::Symbol(_) => SCV_SYMBOL,
            TypedValue::Vec(_) => SCV_VEC,
            TypedValue::Map(_) => SCV_MAP,
            TypedValue::Address(_) => SCV_ADDRESS,
        }
    }

    fn decode_nested(cursor: &mut Cursor<&[u8]>, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(XdrAsmError::MalformedEnvelope("value nested too deeply".to_string()));
        }

        let value = match decode_i32(cursor)? {
            SCV_BOOL => TypedValue::Bool(decode_bool(cursor)?),
            SCV_VOID => TypedValue::Void,
            SCV_U32 => TypedValue::U32(decode_u32(cursor)?),
            SCV_U64 => TypedValue::U64(decode_u64(cursor)?),
            SCV_I128 => {
                let hi = decode_i64(cursor)?;
                let lo = decode_u64(cursor)?;
                TypedValue::I128 { hi, lo }
            }
            SCV_BYTES => TypedValue::Bytes(decode_var_opaque(cursor, UNBOUNDED)?),
            SCV_STRING => TypedValue::String(decode_var_opaque(cursor, UNBOUNDED)?),
            SCV_SYMBOL => {
                let name = decode_string(cursor, SCSYMBOL_LIMIT)?;
                validate_symbol(&name).map_err(XdrAsmError::into_malformed)?;
                TypedValue::Symbol(name)
            }
            SCV_VEC => {
                if !decode_bool(cursor)? {
                    return Err(XdrAsmError::MalformedEnvelope("absent vec value".to_string()));
                }
                let count = decode_len(cursor, UNBOUNDED)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(Self::decode_nested(cursor, depth + 1)?);
                }
                TypedValue::Vec(items)
            }
            SCV_MAP => {
                if !decode_bool(cursor)? {
                    return Err(XdrAsmError::MalformedEnvelope("absent map value".to_string()));
                }
                // each entry is at least a key and a value tag
                let count = decode_len(cursor, UNBOUNDED)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let key = Self::decode_nested(cursor, depth + 1)?;
                    let value = Self::decode_nested(cursor, depth + 1)?;
                    entries.push((key, value));
                }
                TypedValue::Map(entries)
            }
            SCV_ADDRESS => TypedValue::Address(ScAddress::deserialize_bytes(cursor)?),
            other => {
                return Err(XdrAsmError::MalformedEnvelope(format!(
                    "unsupported value type {}",
                    other
                )))
            }
        };
        Ok(value)
    }
}

impl ByteSerialize for TypedValue {
    fn serialize_bytes(&self, writer: &mut Vec<u8>) -> Result<()> {
        encode_i32(self.discriminant(), writer)?;
        match self {
            TypedValue::Bool(b) => encode_bool(*b, writer),
            TypedValue::Void => Ok(()),
            TypedValue::U32(n) => encode_u32(*n, writer),
            TypedValue::U64(n) => encode_u64(*n, writer),
            TypedValue::I128 { hi, lo } => {
                encode_i64(*hi, writer)?;
                encode_u64(*lo, writer)
            }
            TypedValue::Bytes(bytes) => encode_var_opaque(bytes, UNBOUNDED, writer),
            TypedValue::String(bytes) => encode_var_opaque(bytes, UNBOUNDED, writer),
            TypedValue::Symbol(name) => encode_string(name, SCSYMBOL_LIMIT, writer),
            TypedValue::Vec(items) => {
                // SCVec is an optional on the wire; always present here
                encode_bool(true, writer)?;
                encode_len(items.len(), UNBOUNDED, writer)?;
                for item in items {
                    item.serialize_bytes(writer)?;
                }
                Ok(())
            }
            TypedValue::Map(entries) => {
                encode_bool(true, writer)?;
                encode_len(entries.len(), UNBOUNDED, writer)?;
                for (key, value) in entries {
                    key.serialize_bytes(writer)?;
                    value.serialize_bytes(writer)?;
                }
                Ok(())
            }
            TypedValue::Address(address) => address.serialize_bytes(writer),
        }
    }
}

impl ByteDeserialize for TypedValue {
    fn deserialize_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Self::decode_nested(cursor, 0)
    }
}

/// Key order the ledger requires for map entries: by value type, then by
/// value. Numbers compare numerically, byte strings lexicographically,
/// vectors and maps element by element.
pub fn canonical_cmp(a: &TypedValue, b: &TypedValue) -> Ordering {
    use TypedValue::*;
    match (a, b) {
        (Bool(x), Bool(y)) => x.cmp(y),
        (Void, Void) => Ordering::Equal,
        (U32(x), U32(y)) => x.cmp(y),
        (U64(x), U64(y)) => x.cmp(y),
        (I128 { hi: xh, lo: xl }, I128 { hi: yh, lo: yl }) => (xh, xl).cmp(&(yh, yl)),
        (Bytes(x), Bytes(y)) | (String(x), String(y)) => x.cmp(y),
        (Symbol(x), Symbol(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Vec(x), Vec(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| canonical_cmp(l, r))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Map(x), Map(y)) => x
            .iter()
            .zip(y)
            .map(|((lk, lv), (rk, rv))| canonical_cmp(lk, rk).then_with(|| canonical_cmp(lv, rv)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Address(x), Address(y)) => address_key(x).cmp(&address_key(y)),
        _ => a.discriminant().cmp(&b.discriminant()),
    }
}

fn address_key(address: &ScAddress) -> (u8, [u8; 32]) {
    match address {
        ScAddress::Account(account) => (0, account.0),
        ScAddress::Contract(contract) => (1, contract.0),
    }
}

/// Check the `SCSymbol` character set and length
pub fn validate_symbol(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= SCSYMBOL_LIMIT as usize
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(XdrAsmError::InvalidSymbol(name.to_string()))
    }
}

/// Loosely typed application value, as it arrives from a form or JSON
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i128),
    Text(String),
    Binary(Vec<u8>),
    List(Vec<ArgValue>),
    /// JSON object, as produced by `From<serde_json::Value>`
    Object(serde_json::Map<String, serde_json::Value>),
}

impl ArgValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "integer",
            ArgValue::Text(_) => "text",
            ArgValue::Binary(_) => "binary",
            ArgValue::List(_) => "list",
            ArgValue::Object(_) => "object",
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<i128> for ArgValue {
    fn from(value: i128) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value.into())
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Int(value.into())
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(value: Vec<u8>) -> Self {
        ArgValue::Binary(value)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ArgValue::Null,
            Value::Bool(b) => ArgValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ArgValue::Int(i.into())
                } else if let Some(u) = n.as_u64() {
                    ArgValue::Int(u.into())
                } else {
                    // fractional numbers fail integer coercion later
                    ArgValue::Text(n.to_string())
                }
            }
            Value::String(s) => ArgValue::Text(s),
            Value::Array(items) => ArgValue::List(items.into_iter().map(ArgValue::from).collect()),
            Value::Object(fields) => ArgValue::Object(fields),
        }
    }
}

/// Declared type of a contract argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    AccountAddress,
    ContractAddress,
    String,
    U32,
    I128,
    Bytes,
    Bool,
    U64,
    Symbol,
    Void,
    Vec(Box<ArgType>),
    /// Contract struct: named fields, encoded as a map keyed by symbol
    Struct(Vec<(String, ArgType)>),
}

fn coerce_integer(value: &ArgValue) -> Result<i128> {
    match value {
        ArgValue::Int(n) => Ok(*n),
        ArgValue::Text(text) => parse_i128(text),
        other => Err(XdrAsmError::TypeMismatch {
            expected: "integer",
            found: other.kind_name(),
        }),
    }
}

fn expect_text<'a>(value: &'a ArgValue, expected: &'static str) -> Result<&'a str> {
    match value {
        ArgValue::Text(text) => Ok(text),
        other => Err(XdrAsmError::TypeMismatch {
            expected,
            found: other.kind_name(),
        }),
    }
}

fn narrow<T: TryFrom<i128>>(n: i128, target: &'static str) -> Result<T> {
    T::try_from(n).map_err(|_| XdrAsmError::IntegerRange {
        value: n.to_string(),
        target,
    })
}

/// Encode an application value as the declared type.
///
/// `Null` is rejected with `MissingArgument`; callers that want lenient
/// handling of absent arguments decide that before calling this.
pub fn encode(value: &ArgValue, declared: &ArgType) -> Result<TypedValue> {
    if value.is_null() && *declared != ArgType::Void {
        return Err(XdrAsmError::MissingArgument("value is null".to_string()));
    }

    match declared {
        ArgType::AccountAddress => {
            let text = expect_text(value, "account address")?;
            Ok(TypedValue::Address(ScAddress::from_strkey(text, AddressKind::Account)?))
        }
        ArgType::ContractAddress => {
            let text = expect_text(value, "contract address")?;
            Ok(TypedValue::Address(ScAddress::from_strkey(text, AddressKind::Contract)?))
        }
        ArgType::String => Ok(TypedValue::string(expect_text(value, "string")?)),
        ArgType::Symbol => TypedValue::symbol(expect_text(value, "symbol")?),
        ArgType::U32 => Ok(TypedValue::U32(narrow(coerce_integer(value)?, "u32")?)),
        ArgType::U64 => Ok(TypedValue::U64(narrow(coerce_integer(value)?, "u64")?)),
        ArgType::I128 => Ok(TypedValue::i128(coerce_integer(value)?)),
        ArgType::Bytes => Ok(TypedValue::Bytes(normalize_bytes(value)?)),
        ArgType::Bool => match value {
            ArgValue::Bool(b) => Ok(TypedValue::Bool(*b)),
            ArgValue::Text(text) if text == "true" || text == "false" => {
                Ok(TypedValue::Bool(text == "true"))
            }
            other => Err(XdrAsmError::TypeMismatch {
                expected: "bool",
                found: other.kind_name(),
            }),
        },
        ArgType::Void => match value {
            ArgValue::Null => Ok(TypedValue::Void),
            other => Err(XdrAsmError::TypeMismatch {
                expected: "null",
                found: other.kind_name(),
            }),
        },
        ArgType::Vec(inner) => match value {
            ArgValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| encode(item, inner).map_err(|e| e.for_argument(&format!("[{}]", i))))
                .collect::<Result<Vec<_>>>()
                .map(TypedValue::Vec),
            other => Err(XdrAsmError::TypeMismatch {
                expected: "list",
                found: other.kind_name(),
            }),
        },
        ArgType::Struct(fields) => encode_struct(value, fields),
    }
}

/// Encode an object as a contract struct. Every declared field must be
/// present and no undeclared field may appear; keys end up sorted by name.
fn encode_struct(value: &ArgValue, fields: &[(String, ArgType)]) -> Result<TypedValue> {
    let parsed;
    let object = match value {
        ArgValue::Object(object) => object,
        ArgValue::Text(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(object)) => {
                parsed = object;
                &parsed
            }
            _ => {
                return Err(XdrAsmError::TypeMismatch {
                    expected: "object",
                    found: "text",
                })
            }
        },
        other => {
            return Err(XdrAsmError::TypeMismatch {
                expected: "object",
                found: other.kind_name(),
            })
        }
    };

    if let Some(extra) = object
        .keys()
        .find(|key| !fields.iter().any(|(name, _)| name == *key))
    {
        return Err(XdrAsmError::UnknownField(extra.clone()));
    }

    let mut entries = Vec::with_capacity(fields.len());
    for (name, field_type) in fields {
        let key = TypedValue::symbol(name)?;
        let field_value = ArgValue::from(object.get(name).cloned().unwrap_or(serde_json::Value::Null));
        let encoded = encode(&field_value, field_type).map_err(|e| e.for_argument(name))?;
        entries.push((key, encoded));
    }
    TypedValue::map(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AccountId, ContractId};

    #[test]
    fn test_u32_encoding_bytes() {
        let value = encode(&ArgValue::Int(7), &ArgType::U32).unwrap();
        assert_eq!(hex::encode(value.to_xdr().unwrap()), "0000000300000007");
    }

    #[test]
    fn test_u32_from_numeric_text() {
        let value = encode(&ArgValue::from("4294967295"), &ArgType::U32).unwrap();
        assert_eq!(value, TypedValue::U32(u32::MAX));
    }

    #[test]
    fn test_u32_out_of_range() {
        for bad in [ArgValue::Int(-1), ArgValue::Int(1 << 32), ArgValue::from("4294967296")] {
            assert!(matches!(
                encode(&bad, &ArgType::U32),
                Err(XdrAsmError::IntegerRange { target: "u32", .. })
            ));
        }
    }

    #[test]
    fn test_i128_minus_one() {
        let value = encode(&ArgValue::Int(-1), &ArgType::I128).unwrap();
        assert_eq!(value, TypedValue::I128 { hi: -1, lo: u64::MAX });
        assert_eq!(
            hex::encode(value.to_xdr().unwrap()),
            "0000000affffffffffffffffffffffffffffffff"
        );
    }

    #[test]
    fn test_i128_overflow_from_text() {
        let text = "340282366920938463463374607431768211456";
        assert!(matches!(
            encode(&ArgValue::from(text), &ArgType::I128),
            Err(XdrAsmError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn test_address_kinds_encode_differently() {
        let account = AccountId([4u8; 32]).to_strkey();
        let contract = ContractId([4u8; 32]).to_strkey();

        let a = encode(&ArgValue::from(account.as_str()), &ArgType::AccountAddress).unwrap();
        let c = encode(&ArgValue::from(contract.as_str()), &ArgType::ContractAddress).unwrap();
        assert_ne!(a.to_xdr().unwrap(), c.to_xdr().unwrap());
        assert!(encode(&ArgValue::from(contract.as_str()), &ArgType::AccountAddress).is_err());
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            encode(&ArgValue::from("GNOTANADDRESS"), &ArgType::AccountAddress),
            Err(XdrAsmError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_null_is_missing_argument() {
        assert!(matches!(
            encode(&ArgValue::Null, &ArgType::String),
            Err(XdrAsmError::MissingArgument(_))
        ));
        assert_eq!(encode(&ArgValue::Null, &ArgType::Void).unwrap(), TypedValue::Void);
    }

    #[test]
    fn test_string_has_no_local_limit() {
        let long = "x".repeat(10_000);
        let value = encode(&ArgValue::from(long.as_str()), &ArgType::String).unwrap();
        assert_eq!(value, TypedValue::String(long.into_bytes()));
    }

    #[test]
    fn test_symbol_validation() {
        assert!(encode(&ArgValue::from("transfer"), &ArgType::Symbol).is_ok());
        assert!(matches!(
            encode(&ArgValue::from("not a symbol"), &ArgType::Symbol),
            Err(XdrAsmError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_nested_vec_error_names_index() {
        let list = ArgValue::List(vec![ArgValue::Int(1), ArgValue::from("x")]);
        let err = encode(&list, &ArgType::Vec(Box::new(ArgType::U32))).unwrap_err();
        assert!(err.to_string().contains("[1]"), "{}", err);
    }

    #[test]
    fn test_distinct_values_encode_distinctly() {
        let values = vec![
            TypedValue::Bool(false),
            TypedValue::Void,
            TypedValue::U32(0),
            TypedValue::U64(0),
            TypedValue::i128(0),
            TypedValue::Bytes(vec![]),
            TypedValue::String(Vec::new()),
            TypedValue::Symbol("a".to_string()),
            TypedValue::Vec(vec![]),
            TypedValue::Map(vec![]),
            TypedValue::Address(ScAddress::Contract(ContractId([0u8; 32]))),
        ];
        let encoded: Vec<Vec<u8>> = values.iter().map(|v| v.to_xdr().unwrap()).collect();
        for i in 0..encoded.len() {
            for j in (i + 1)..encoded.len() {
                assert_ne!(encoded[i], encoded[j], "{:?} vs {:?}", values[i], values[j]);
            }
        }
    }

    #[test]
    fn test_decode_nested_vec() {
        let value = TypedValue::Vec(vec![
            TypedValue::U32(1),
            TypedValue::Vec(vec![TypedValue::string("hi")]),
            TypedValue::i128(-5),
        ]);
        let bytes = value.to_xdr().unwrap();
        assert_eq!(TypedValue::from_xdr(&bytes).unwrap(), value);
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"k": [1, "two", null]});
        let ArgValue::Object(fields) = ArgValue::from(json) else {
            panic!("expected object");
        };
        assert_eq!(fields["k"], serde_json::json!([1, "two", null]));
        let list = ArgValue::from(serde_json::json!([1, "two", null]));
        assert_eq!(
            list,
            ArgValue::List(vec![ArgValue::Int(1), ArgValue::from("two"), ArgValue::Null])
        );
    }

    fn call_intent_type() -> ArgType {
        ArgType::Struct(vec![
            ("v".to_string(), ArgType::U32),
            ("contract_id".to_string(), ArgType::ContractAddress),
            ("fn_name".to_string(), ArgType::Symbol),
            ("args".to_string(), ArgType::Vec(Box::new(ArgType::Bytes))),
            ("signer".to_string(), ArgType::AccountAddress),
            ("nonce".to_string(), ArgType::Bytes),
            ("iat".to_string(), ArgType::U64),
            ("exp".to_string(), ArgType::U64),
        ])
    }

    fn call_intent_json() -> serde_json::Value {
        serde_json::json!({
            "v": 1,
            "contract_id": ContractId([7u8; 32]).to_strkey(),
            "fn_name": "mint",
            "args": ["AAAAAwAAAAc="],
            "signer": AccountId([3u8; 32]).to_strkey(),
            "nonce": base64_of(&[9u8; 32]),
            "iat": 1_700_000_000u64,
            "exp": 1_700_000_300u64,
        })
    }

    fn base64_of(bytes: &[u8]) -> String {
        crate::serialization::encode_base64(bytes)
    }

    #[test]
    fn test_struct_keys_sorted_by_name() {
        let value = encode(&ArgValue::from(call_intent_json()), &call_intent_type()).unwrap();
        let TypedValue::Map(entries) = &value else {
            panic!("expected map");
        };
        let keys: Vec<&str> = entries
            .iter()
            .map(|(key, _)| match key {
                TypedValue::Symbol(name) => name.as_str(),
                other => panic!("non-symbol key {:?}", other),
            })
            .collect();
        assert_eq!(
            keys,
            ["args", "contract_id", "exp", "fn_name", "iat", "nonce", "signer", "v"]
        );
        assert_eq!(entries[5].1, TypedValue::Bytes(vec![9u8; 32]));
        assert_eq!(
            entries[0].1,
            TypedValue::Vec(vec![TypedValue::Bytes(hex::decode("0000000300000007").unwrap())])
        );

        let bytes = value.to_xdr().unwrap();
        // SCV_MAP, present, 8 entries, first key is the symbol "args"
        assert_eq!(
            hex::encode(&bytes[..24]),
            "0000001100000001000000080000000f0000000461726773"
        );
        assert_eq!(TypedValue::from_xdr(&bytes).unwrap(), value);
    }

    #[test]
    fn test_struct_from_json_text() {
        let text = call_intent_json().to_string();
        let from_text = encode(&ArgValue::from(text.as_str()), &call_intent_type()).unwrap();
        let from_object = encode(&ArgValue::from(call_intent_json()), &call_intent_type()).unwrap();
        assert_eq!(from_text, from_object);
    }

    #[test]
    fn test_struct_field_errors() {
        let mut missing = call_intent_json();
        missing.as_object_mut().unwrap().remove("nonce");
        let err = encode(&ArgValue::from(missing), &call_intent_type()).unwrap_err();
        assert!(matches!(err, XdrAsmError::Argument { ref name, .. } if name == "nonce"));

        let mut extra = call_intent_json();
        extra.as_object_mut().unwrap().insert("memo".to_string(), serde_json::json!("x"));
        assert!(matches!(
            encode(&ArgValue::from(extra), &call_intent_type()),
            Err(XdrAsmError::UnknownField(ref field)) if field == "memo"
        ));

        assert!(matches!(
            encode(&ArgValue::Int(1), &call_intent_type()),
            Err(XdrAsmError::TypeMismatch { expected: "object", .. })
        ));
    }

    #[test]
    fn test_map_constructor_orders_keys() {
        let map = TypedValue::map(vec![
            (TypedValue::U32(10), TypedValue::Void),
            (TypedValue::U32(2), TypedValue::Void),
            (TypedValue::Bool(true), TypedValue::Void),
        ])
        .unwrap();
        assert_eq!(
            map,
            TypedValue::Map(vec![
                (TypedValue::Bool(true), TypedValue::Void),
                (TypedValue::U32(2), TypedValue::Void),
                (TypedValue::U32(10), TypedValue::Void),
            ])
        );
        assert!(TypedValue::map(vec![
            (TypedValue::string("a"), TypedValue::Void),
            (TypedValue::string("a"), TypedValue::U32(1)),
        ])
        .is_err());
    }

    #[test]
    fn test_non_utf8_string_round_trips() {
        let value = TypedValue::String(vec![0xff, 0xfe]);
        let bytes = value.to_xdr().unwrap();
        assert_eq!(hex::encode(&bytes), "0000000e00000002fffe0000");
        assert_eq!(TypedValue::from_xdr(&bytes).unwrap(), value);
    }
}
