//! XdrAsm - Low-Level Stellar/Soroban Transaction Encoder and Signer
//!
//! Turns payment and contract-call intents into canonical XDR transaction
//! envelopes, prepares contract invocations against an RPC server's
//! simulation endpoint, signs them for a specific network and renders the
//! result as base64 ready for submission.
//!
//! The flow is `build` → `prepare` (contract calls only) → `sign` →
//! `serialize`.

pub mod address;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fee_calculator;
pub mod int128;
pub mod operation;
pub mod payload;
pub mod prepare;
pub mod serialization;
pub mod signing;
pub mod soroban;
pub mod transaction;
pub mod value;

pub use envelope::{deserialize, serialize, SignedEnvelope};
pub use error::{Result, XdrAsmError};
pub use fee_calculator::FeeCalculator;
pub use operation::{BuildWarning, ContractCall, Intent, NullArgumentPolicy};
pub use prepare::{prepare, RpcClient, SimulationClient};
pub use signing::{sign, Keypair};
pub use transaction::{build, PreparedEnvelope, TransactionBuilder, UnsignedEnvelope};
pub use value::{encode, ArgType, ArgValue, TypedValue};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::address::{AccountId, ContractId, MuxedAccount, ScAddress};
    pub use crate::config::Network;
    pub use crate::envelope::{deserialize, serialize, SignedEnvelope};
    pub use crate::error::XdrAsmError;
    pub use crate::operation::{Asset, ContractCall, Intent, NullArgumentPolicy};
    pub use crate::prepare::{prepare, RpcClient, SimulationClient};
    pub use crate::signing::{sign, Keypair};
    pub use crate::transaction::{build, Memo, TransactionBuilder};
    pub use crate::value::{ArgType, ArgValue};
}
