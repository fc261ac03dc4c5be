//! Transaction classifier
//!
//! Pure mapping from a raw transaction record to a (status, type) pair.
//! Type resolution runs an ordered rule table top to bottom; the first
//! satisfied rule wins. The table replaces the long chained conditional
//! that grows around this kind of taxonomy: each entry is a standalone
//! (predicate, result) pair, so rule order stays auditable and each rule
//! is testable in isolation.
//!
//! Classification is deterministic and side-effect free: identical input
//! always yields the identical pair.

/// Outcome of a transaction as reported by block metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxStatus {
    Success,
    Failed,
    Unknown,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Success => "Success",
            TxStatus::Failed => "Failed",
            TxStatus::Unknown => "Unknown",
        }
    }
}

/// Closed semantic taxonomy for transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxType {
    UpdatePrice,
    Transaction,
    Vote,
    Bpf,
    System,
    ComputeBudget,
    Scan,
    Oracle,
    CancelOrder,
    Unknown,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::UpdatePrice => "UpdatePrice",
            TxType::Transaction => "Transaction",
            TxType::Vote => "Vote",
            TxType::Bpf => "BPF",
            TxType::System => "System",
            TxType::ComputeBudget => "ComputeBudget",
            TxType::Scan => "Scan",
            TxType::Oracle => "Oracle",
            TxType::CancelOrder => "CancelOrder",
            TxType::Unknown => "Unknown",
        }
    }
}

/// How the compute-budget rule inspects instructions.
///
/// `Strict` checks the first instruction only; `Relaxed` requires every
/// instruction to target the compute-budget program. The source data only
/// ever exercised the strict branch, so that is the default; both are kept
/// as an explicit option rather than hard-wiring one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeBudgetMatching {
    #[default]
    Strict,
    Relaxed,
}

/// One instruction as seen by the classifier: the parsed instruction type
/// (when the RPC could decode it) and the owning program id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSummary {
    pub parsed_type: Option<String>,
    pub program_id: Option<String>,
}

/// Error indicator extracted from block metadata.
///
/// `Clear` means the field was present and explicitly null; `Raised` means
/// present and non-null; `Undetermined` means the metadata (or the field
/// itself) was missing, so the outcome cannot be known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorIndicator {
    Clear,
    Raised,
    Undetermined,
}

pub fn classify_status(err: ErrorIndicator) -> TxStatus {
    match err {
        ErrorIndicator::Clear => TxStatus::Success,
        ErrorIndicator::Raised => TxStatus::Failed,
        ErrorIndicator::Undetermined => TxStatus::Unknown,
    }
}

const PRICE_ORACLE_PROGRAM: &str = "FsJ3A3u2vn5cTVofAjvy6y5kwABJAqYWpe4975bi2epH";
const COMPUTE_BUDGET_PROGRAM: &str = "ComputeBudget111111111111111111111111111111";
const VOTE_STATE_UPDATE_MARKER: &str = "compactupdatevotestate";
const BPF_LOADER_UPGRADE_MARKER: &str = "BPFLoaderUpgradeab1e11111111111111111111111";

/// Predicate half of a classification rule.
///
/// "First" predicates look at the first instruction only; log predicates
/// compare whole log lines except `LogContains`, which is a substring scan.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// First instruction's program id equals the given id.
    FirstProgramIs(&'static str),
    /// First instruction's parsed type equals the given marker.
    FirstParsedIs(&'static str),
    /// First instruction's parsed type is one of the given markers.
    FirstParsedIn(&'static [&'static str]),
    /// Compute-budget program match, honouring [`ComputeBudgetMatching`].
    ComputeBudget,
    /// Some log line equals the given line.
    LogLineIs(&'static str),
    /// Every one of the given lines appears in the logs.
    LogLinesAll(&'static [&'static str]),
    /// Some log line equals one of the given lines.
    LogLineAnyOf(&'static [&'static str]),
    /// Some log line starts with the given prefix.
    LogLinePrefix(&'static str),
    /// Some log line contains the given substring.
    LogContains(&'static str),
}

impl Predicate {
    fn matches(
        &self,
        instructions: &[InstructionSummary],
        logs: &[String],
        matching: ComputeBudgetMatching,
    ) -> bool {
        let first_parsed = instructions.first().and_then(|i| i.parsed_type.as_deref());
        let first_program = instructions.first().and_then(|i| i.program_id.as_deref());

        match self {
            Predicate::FirstProgramIs(id) => first_program == Some(*id),
            Predicate::FirstParsedIs(marker) => first_parsed == Some(*marker),
            Predicate::FirstParsedIn(markers) => {
                first_parsed.is_some_and(|p| markers.contains(&p))
            }
            Predicate::ComputeBudget => match matching {
                ComputeBudgetMatching::Strict => first_program == Some(COMPUTE_BUDGET_PROGRAM),
                ComputeBudgetMatching::Relaxed => {
                    !instructions.is_empty()
                        && instructions
                            .iter()
                            .all(|i| i.program_id.as_deref() == Some(COMPUTE_BUDGET_PROGRAM))
                }
            },
            Predicate::LogLineIs(line) => logs.iter().any(|l| l == line),
            Predicate::LogLinesAll(lines) => {
                lines.iter().all(|line| logs.iter().any(|l| l == line))
            }
            Predicate::LogLineAnyOf(lines) => {
                logs.iter().any(|l| lines.contains(&l.as_str()))
            }
            Predicate::LogLinePrefix(prefix) => logs.iter().any(|l| l.starts_with(prefix)),
            Predicate::LogContains(needle) => logs.iter().any(|l| l.contains(needle)),
        }
    }
}

/// The ordered rule table. Evaluated top to bottom; first match wins.
///
/// Order is behaviour: the log-marker System rules sit above the
/// compute-budget rule, so a compute-budget transaction whose logs carry a
/// `FunctionVerify` marker classifies as `System`.
pub const TYPE_RULES: &[(Predicate, TxType)] = &[
    (Predicate::FirstProgramIs(PRICE_ORACLE_PROGRAM), TxType::UpdatePrice),
    (
        Predicate::FirstParsedIn(&["transfer", "create", "mintTo", "transferChecked"]),
        TxType::Transaction,
    ),
    (Predicate::FirstParsedIs(VOTE_STATE_UPDATE_MARKER), TxType::Vote),
    (Predicate::FirstParsedIs(BPF_LOADER_UPGRADE_MARKER), TxType::Bpf),
    (Predicate::FirstParsedIs("extendLookupTable"), TxType::System),
    (
        Predicate::LogLineIs("Program log: Instruction: FunctionVerify"),
        TxType::System,
    ),
    (
        Predicate::LogLineIs("Program log: Instruction: FleetStateHandler"),
        TxType::System,
    ),
    (Predicate::ComputeBudget, TxType::ComputeBudget),
    (
        Predicate::LogLinesAll(&[
            "Program log: Instruction: PreTransaction",
            "Program log: Instruction: PostTransactionNoVault",
        ]),
        TxType::Transaction,
    ),
    (
        Predicate::LogLineIs("Program log: Instruction: ScanForSurveyDataUnits"),
        TxType::Scan,
    ),
    (
        Predicate::LogLineAnyOf(&[
            "Program log: Instruction: OracleHeartbeat",
            "Program log: Oracle",
        ]),
        TxType::Oracle,
    ),
    (Predicate::LogLineIs("Program log: Instruction: RescindLoan"), TxType::Transaction),
    (Predicate::LogLineIs("Program log: Instruction: Transfer"), TxType::Transaction),
    (
        Predicate::LogLineIs("Program log: Instruction: ClosePositionRequest"),
        TxType::Transaction,
    ),
    (Predicate::LogLineIs("Program log: Instruction: Swap"), TxType::Transaction),
    (Predicate::LogLineIs("Program log: Instruction: Claim"), TxType::Transaction),
    (Predicate::LogLineIs("Program log: Instruction: Repay"), TxType::Transaction),
    (Predicate::LogLineIs("Program log: Instruction: Route"), TxType::Transaction),
    (Predicate::LogLineIs("Program log: Instruction: InitPool"), TxType::Transaction),
    (
        Predicate::LogLineIs("Program log: Instruction: AttachPoolToMargin"),
        TxType::Transaction,
    ),
    (Predicate::LogLineIs("Program log: Instruction: Borrow"), TxType::Transaction),
    (Predicate::LogLinePrefix("Program log: Returned loan of"), TxType::Transaction),
    (Predicate::LogLineIs("Program log: Create"), TxType::Transaction),
    (
        Predicate::LogLinePrefix("Program log: Instruction: Initialize"),
        TxType::Transaction,
    ),
    (Predicate::LogLineIs("Program log: Instruction: MintTo"), TxType::Transaction),
    (
        Predicate::LogLinePrefix("Program log: Instruction: PlacePerpOrder"),
        TxType::Transaction,
    ),
    (
        Predicate::LogLinePrefix("Program log: Instruction: LiquidatePerp"),
        TxType::Transaction,
    ),
    (
        Predicate::LogLineIs("Program log: Instruction: SharedAccountsRoute"),
        TxType::Transaction,
    ),
    (Predicate::LogLineIs("Program log: Instruction: LiquidUnstake"), TxType::Transaction),
    (Predicate::LogContains("Cancel"), TxType::CancelOrder),
];

/// Resolve the semantic type for a transaction.
///
/// An empty instruction list behaves as one synthetic instruction with no
/// parsed type and no program id, so the first-instruction rules fall
/// through to the log-scanning rules.
pub fn classify_type(
    instructions: &[InstructionSummary],
    logs: &[String],
    matching: ComputeBudgetMatching,
) -> TxType {
    for (predicate, result) in TYPE_RULES {
        if predicate.matches(instructions, logs, matching) {
            return *result;
        }
    }
    TxType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(parsed: Option<&str>, program: Option<&str>) -> InstructionSummary {
        InstructionSummary {
            parsed_type: parsed.map(str::to_string),
            program_id: program.map(str::to_string),
        }
    }

    fn logs(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_status_from_error_indicator() {
        assert_eq!(classify_status(ErrorIndicator::Clear), TxStatus::Success);
        assert_eq!(classify_status(ErrorIndicator::Raised), TxStatus::Failed);
        assert_eq!(classify_status(ErrorIndicator::Undetermined), TxStatus::Unknown);
    }

    #[test]
    fn test_price_oracle_program_wins_first() {
        // Oracle program id outranks a transfer parsed type.
        let instructions = vec![ins(Some("transfer"), Some(PRICE_ORACLE_PROGRAM))];
        assert_eq!(
            classify_type(&instructions, &[], ComputeBudgetMatching::Strict),
            TxType::UpdatePrice
        );
    }

    #[test]
    fn test_parsed_type_transfers() {
        for parsed in ["transfer", "create", "mintTo", "transferChecked"] {
            let instructions = vec![ins(Some(parsed), Some("SomeProgram"))];
            assert_eq!(
                classify_type(&instructions, &[], ComputeBudgetMatching::Strict),
                TxType::Transaction
            );
        }
    }

    #[test]
    fn test_vote_and_bpf_markers() {
        let vote = vec![ins(Some(VOTE_STATE_UPDATE_MARKER), None)];
        assert_eq!(classify_type(&vote, &[], ComputeBudgetMatching::Strict), TxType::Vote);

        let bpf = vec![ins(Some(BPF_LOADER_UPGRADE_MARKER), None)];
        assert_eq!(classify_type(&bpf, &[], ComputeBudgetMatching::Strict), TxType::Bpf);
    }

    #[test]
    fn test_log_marker_system_precedes_compute_budget() {
        // Rule precedence: a compute-budget transaction whose logs carry a
        // FunctionVerify marker must classify as System, not ComputeBudget.
        let instructions = vec![ins(None, Some(COMPUTE_BUDGET_PROGRAM))];
        let logs = logs(&["Program log: Instruction: FunctionVerify"]);
        assert_eq!(
            classify_type(&instructions, &logs, ComputeBudgetMatching::Strict),
            TxType::System
        );
    }

    #[test]
    fn test_compute_budget_strict_checks_first_instruction_only() {
        let instructions = vec![
            ins(None, Some(COMPUTE_BUDGET_PROGRAM)),
            ins(None, Some("OtherProgram")),
        ];
        assert_eq!(
            classify_type(&instructions, &[], ComputeBudgetMatching::Strict),
            TxType::ComputeBudget
        );
        // Relaxed needs every instruction to match.
        assert_eq!(
            classify_type(&instructions, &[], ComputeBudgetMatching::Relaxed),
            TxType::Unknown
        );
    }

    #[test]
    fn test_compute_budget_relaxed_all_instructions() {
        let instructions = vec![
            ins(None, Some(COMPUTE_BUDGET_PROGRAM)),
            ins(None, Some(COMPUTE_BUDGET_PROGRAM)),
        ];
        assert_eq!(
            classify_type(&instructions, &[], ComputeBudgetMatching::Relaxed),
            TxType::ComputeBudget
        );
    }

    #[test]
    fn test_log_scan_markers() {
        let swap = logs(&["Program log: Instruction: Swap"]);
        let scan = logs(&["Program log: Instruction: ScanForSurveyDataUnits"]);
        let oracle = logs(&["Program log: Oracle"]);
        let cancel = logs(&["Program 11111 consumed", "Program log: CancelOrderV2 done"]);
        let none: Vec<InstructionSummary> = vec![];

        assert_eq!(classify_type(&none, &swap, ComputeBudgetMatching::Strict), TxType::Transaction);
        assert_eq!(classify_type(&none, &scan, ComputeBudgetMatching::Strict), TxType::Scan);
        assert_eq!(classify_type(&none, &oracle, ComputeBudgetMatching::Strict), TxType::Oracle);
        assert_eq!(
            classify_type(&none, &cancel, ComputeBudgetMatching::Strict),
            TxType::CancelOrder
        );
    }

    #[test]
    fn test_exact_line_matching_not_substring() {
        // Log markers match whole lines; a line merely containing the
        // marker text falls through (except the Cancel substring rule).
        let near_miss = logs(&["Program log: Instruction: SwapExactIn"]);
        let none: Vec<InstructionSummary> = vec![];
        assert_eq!(
            classify_type(&none, &near_miss, ComputeBudgetMatching::Strict),
            TxType::Unknown
        );
    }

    #[test]
    fn test_prefix_rules() {
        let none: Vec<InstructionSummary> = vec![];
        let init = logs(&["Program log: Instruction: InitializeAccount3"]);
        assert_eq!(classify_type(&none, &init, ComputeBudgetMatching::Strict), TxType::Transaction);

        let loan = logs(&["Program log: Returned loan of 12 lamports"]);
        assert_eq!(classify_type(&none, &loan, ComputeBudgetMatching::Strict), TxType::Transaction);

        let perp = logs(&["Program log: Instruction: PlacePerpOrderV3"]);
        assert_eq!(classify_type(&none, &perp, ComputeBudgetMatching::Strict), TxType::Transaction);
    }

    #[test]
    fn test_empty_instructions_fall_through_to_logs() {
        let none: Vec<InstructionSummary> = vec![];
        let lines = logs(&["Program log: Instruction: Claim"]);
        assert_eq!(classify_type(&none, &lines, ComputeBudgetMatching::Strict), TxType::Transaction);
        assert_eq!(classify_type(&none, &[], ComputeBudgetMatching::Strict), TxType::Unknown);
    }

    #[test]
    fn test_classifier_is_pure() {
        let instructions = vec![ins(Some("transfer"), Some("Prog"))];
        let lines = logs(&["Program log: Instruction: Swap"]);
        let first = classify_type(&instructions, &lines, ComputeBudgetMatching::Strict);
        for _ in 0..10 {
            assert_eq!(classify_type(&instructions, &lines, ComputeBudgetMatching::Strict), first);
        }
    }
}
