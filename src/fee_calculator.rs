//! Fee calculation for ledger transactions
//!
//! The fee field on the wire is the maximum the source account is willing
//! to pay: the per-operation inclusion fee times the number of operations,
//! plus, for contract invocations, the resource fee reported by simulation.

use crate::config::BASE_FEE;
use crate::error::{Result, XdrAsmError};
use crate::transaction::Transaction;

/// Fee estimation data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEstimate {
    /// Inclusion fee in stroops (base fee × operations)
    pub inclusion_fee: u32,
    /// Resource fee in stroops from simulation, zero for classic operations
    pub resource_fee: u32,
    /// Value written to the transaction's fee field
    pub total_fee: u32,
}

/// Fee calculator with a per-operation base fee
#[derive(Debug, Clone, Copy)]
pub struct FeeCalculator {
    base_fee_per_operation: u32,
}

impl FeeCalculator {
    /// Create a fee calculator with the network minimum base fee
    pub fn new() -> Self {
        Self {
            base_fee_per_operation: BASE_FEE,
        }
    }

    /// Create with custom base fee
    pub fn with_base_fee(base_fee_per_operation: u32) -> Self {
        Self {
            base_fee_per_operation,
        }
    }

    pub fn base_fee(&self) -> u32 {
        self.base_fee_per_operation
    }

    /// Inclusion fee for `num_operations` operations
    pub fn inclusion_fee(&self, num_operations: usize) -> Result<u32> {
        u32::try_from(num_operations)
            .ok()
            .and_then(|n| self.base_fee_per_operation.checked_mul(n))
            .ok_or_else(|| {
                XdrAsmError::IntegerOverflow(format!(
                    "fee {} x {} operations exceeds u32",
                    self.base_fee_per_operation, num_operations
                ))
            })
    }

    /// Add a simulated resource fee to an existing fee
    pub fn with_resource_fee(&self, fee: u32, resource_fee: i64) -> Result<u32> {
        u32::try_from(resource_fee)
            .ok()
            .and_then(|resource| fee.checked_add(resource))
            .ok_or_else(|| {
                XdrAsmError::IntegerOverflow(format!(
                    "fee {} + resource fee {} exceeds u32",
                    fee, resource_fee
                ))
            })
    }

    /// Break down a transaction's fee
    pub fn estimate_fee(&self, transaction: &Transaction) -> Result<FeeEstimate> {
        let inclusion_fee = self.inclusion_fee(transaction.operations.len())?;
        let resource_fee = match transaction.soroban_data() {
            Some(data) => u32::try_from(data.resource_fee).map_err(|_| {
                XdrAsmError::IntegerOverflow(format!("resource fee {}", data.resource_fee))
            })?,
            None => 0,
        };
        let total_fee = inclusion_fee.checked_add(resource_fee).ok_or_else(|| {
            XdrAsmError::IntegerOverflow("total fee exceeds u32".to_string())
        })?;

        Ok(FeeEstimate {
            inclusion_fee,
            resource_fee,
            total_fee,
        })
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccountId;
    use crate::operation::{Asset, Intent};
    use crate::soroban::SorobanTransactionData;
    use crate::transaction::{build, TransactionExt};

    #[test]
    fn test_inclusion_fee_scales_with_operations() {
        let calculator = FeeCalculator::new();
        assert_eq!(calculator.inclusion_fee(1).unwrap(), 100);
        assert_eq!(calculator.inclusion_fee(3).unwrap(), 300);
    }

    #[test]
    fn test_inclusion_fee_overflow() {
        let calculator = FeeCalculator::with_base_fee(u32::MAX);
        assert!(matches!(
            calculator.inclusion_fee(2),
            Err(XdrAsmError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn test_resource_fee_added() {
        let calculator = FeeCalculator::new();
        assert_eq!(calculator.with_resource_fee(100, 58_181).unwrap(), 58_281);
        assert!(calculator.with_resource_fee(100, -1).is_err());
        assert!(calculator.with_resource_fee(u32::MAX, 1).is_err());
    }

    #[test]
    fn test_estimate_fee_for_built_transaction() {
        let source = AccountId([1u8; 32]).to_strkey();
        let destination = AccountId([2u8; 32]).to_strkey();
        let intents = vec![
            Intent::payment(&destination, Asset::Native, 1i64),
            Intent::payment(&destination, Asset::Native, 2i64),
        ];
        let mut tx = build(&source, 1, 150, intents, 0).unwrap().transaction;
        let calculator = FeeCalculator::with_base_fee(150);

        let estimate = calculator.estimate_fee(&tx).unwrap();
        assert_eq!(estimate.total_fee, tx.fee);
        assert_eq!(estimate.resource_fee, 0);

        tx.ext = TransactionExt::V1(SorobanTransactionData {
            resource_fee: 1_000,
            ..Default::default()
        });
        let estimate = calculator.estimate_fee(&tx).unwrap();
        assert_eq!(
            estimate,
            FeeEstimate {
                inclusion_fee: 300,
                resource_fee: 1_000,
                total_fee: 1_300,
            }
        );
    }
}
