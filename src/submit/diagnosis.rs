//! Failure diagnosis by simulation.

use crate::blockchain::types::TxId;
use crate::blockchain::Transaction;
use crate::observability::metrics;
use crate::rpc::{Connection, SimulationResult, TransactionErrorPayload};

pub const PROGRAM_LOG_PREFIX: &str = "Program log: ";

/// What a simulation says about a failed or unconfirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnosis {
    /// Last program log line, prefix stripped.
    ProgramLog(String),
    /// The simulation failed without a program log line.
    SimulationError(TransactionErrorPayload),
    Inconclusive,
}

/// The last `"Program log: "` line, prefix stripped.
pub fn program_log_reason(logs: &[String]) -> Option<&str> {
    logs.iter()
        .rev()
        .find_map(|line| line.strip_prefix(PROGRAM_LOG_PREFIX))
}

/// Logs are only consulted when the simulation itself failed.
pub fn diagnose(simulation: &SimulationResult) -> Diagnosis {
    let Some(err) = &simulation.err else {
        return Diagnosis::Inconclusive;
    };
    match simulation.logs.as_deref().and_then(program_log_reason) {
        Some(reason) => Diagnosis::ProgramLog(reason.to_string()),
        None => Diagnosis::SimulationError(err.clone()),
    }
}

/// Simulate `transaction` and diagnose the result. Simulation errors are
/// logged and yield [`Diagnosis::Inconclusive`].
pub async fn simulate_for_diagnosis(
    connection: &dyn Connection,
    txid: &TxId,
    transaction: &Transaction,
) -> Diagnosis {
    match connection.simulate_transaction(transaction).await {
        Ok(simulation) => {
            metrics::record_simulation("ok");
            let diagnosis = diagnose(&simulation);
            tracing::debug!(
                txid = %txid,
                ?diagnosis,
                units_consumed = ?simulation.units_consumed,
                "Simulated transaction"
            );
            diagnosis
        }
        Err(e) => {
            metrics::record_simulation("error");
            tracing::warn!(txid = %txid, error = %e, "Simulation for diagnosis failed");
            Diagnosis::Inconclusive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn logs(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_last_program_log_wins() {
        let lines = logs(&[
            "Program 11111111111111111111111111111111 invoke [1]",
            "Program log: first",
            "Program log: custom failure reason",
            "Program 11111111111111111111111111111111 failed",
        ]);
        assert_eq!(program_log_reason(&lines), Some("custom failure reason"));
        assert_eq!(program_log_reason(&logs(&["Program consumed 10 units"])), None);
        assert_eq!(program_log_reason(&[]), None);
    }

    #[test]
    fn test_diagnose_prefers_program_log() {
        let simulation = SimulationResult {
            err: Some(TransactionErrorPayload(json!({"InstructionError": [0, {"Custom": 1}]}))),
            logs: Some(logs(&["Program log: insufficient margin"])),
            units_consumed: None,
        };
        assert_eq!(
            diagnose(&simulation),
            Diagnosis::ProgramLog("insufficient margin".to_string())
        );
    }

    #[test]
    fn test_diagnose_falls_back_to_error() {
        let err = TransactionErrorPayload(json!("BlockhashNotFound"));
        let simulation = SimulationResult {
            err: Some(err.clone()),
            logs: None,
            units_consumed: None,
        };
        assert_eq!(diagnose(&simulation), Diagnosis::SimulationError(err));
        assert_eq!(diagnose(&SimulationResult::default()), Diagnosis::Inconclusive);
    }

    #[test]
    fn test_successful_simulation_logs_ignored() {
        let simulation = SimulationResult {
            err: None,
            logs: Some(logs(&["Program log: Instruction: Transfer"])),
            units_consumed: Some(4_000),
        };
        assert_eq!(diagnose(&simulation), Diagnosis::Inconclusive);
    }
}
