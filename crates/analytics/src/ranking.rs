//! Professional ranking: per-account totals of the four money flows that
//! involve a professional account.

use monnaie_core::table::columns;
use monnaie_core::{AccountKind, Amount, CellValue, EnrichedRow, EnrichedTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// One line of the ranking. Amounts are whole currency units, rounded up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRow {
    #[serde(rename = "Professionnel")]
    pub account: String,
    #[serde(rename = "B2B Reçu")]
    pub b2b_received: i64,
    #[serde(rename = "B2B Emis")]
    pub b2b_emitted: i64,
    #[serde(rename = "Rémunération")]
    pub remuneration: i64,
    #[serde(rename = "Reconversion")]
    pub reconversion: i64,
    #[serde(rename = "Total Reçu")]
    pub total_received: i64,
}

/// Which side of a transaction a flow is credited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Sender,
    Recipient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// P or U paying a professional, credited to the recipient.
    B2bReceived,
    /// P paying another P, credited to the sender.
    B2bEmitted,
    /// P paying an individual, credited to the sender.
    Remuneration,
    /// Vault paying a professional, credited to the recipient.
    Reconversion,
}

impl Flow {
    pub const ALL: [Flow; 4] = [
        Flow::B2bReceived,
        Flow::B2bEmitted,
        Flow::Remuneration,
        Flow::Reconversion,
    ];

    pub fn applies(self, sender: AccountKind, recipient: AccountKind) -> bool {
        use AccountKind::{Individual, Professional, Vault};
        match self {
            Flow::B2bReceived => {
                recipient == Professional && matches!(sender, Professional | Individual)
            }
            Flow::B2bEmitted => sender == Professional && recipient == Professional,
            Flow::Remuneration => sender == Professional && recipient == Individual,
            Flow::Reconversion => sender == Vault && recipient == Professional,
        }
    }

    pub fn party(self) -> Party {
        match self {
            Flow::B2bReceived | Flow::Reconversion => Party::Recipient,
            Flow::B2bEmitted | Flow::Remuneration => Party::Sender,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Flow::B2bReceived => "b2b_received",
            Flow::B2bEmitted => "b2b_emitted",
            Flow::Remuneration => "remuneration",
            Flow::Reconversion => "reconversion",
        }
    }
}

/// Exact per-account sums, before rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowTotals {
    pub b2b_received: Amount,
    pub b2b_emitted: Amount,
    pub remuneration: Amount,
    pub reconversion: Amount,
}

impl FlowTotals {
    pub fn add(&mut self, flow: Flow, amount: Amount) {
        match flow {
            Flow::B2bReceived => self.b2b_received += amount,
            Flow::B2bEmitted => self.b2b_emitted += amount,
            Flow::Remuneration => self.remuneration += amount,
            Flow::Reconversion => self.reconversion += amount,
        }
    }

    fn into_row(self, account: String) -> RankingRow {
        let b2b_received = self.b2b_received.ceil_units();
        let reconversion = self.reconversion.ceil_units();
        RankingRow {
            account,
            b2b_received,
            b2b_emitted: self.b2b_emitted.ceil_units(),
            remuneration: self.remuneration.ceil_units(),
            reconversion,
            // Built from the rounded columns so the row always adds up.
            total_received: b2b_received.saturating_add(reconversion),
        }
    }
}

/// Column positions the ranking reads. Any of them may be absent.
struct Columns {
    amount: Option<usize>,
    sender: Option<usize>,
    recipient: Option<usize>,
}

impl Columns {
    fn locate(table: &EnrichedTable) -> Self {
        let find = |name: &str| {
            let idx = table.column_index(name);
            if idx.is_none() && !table.is_empty() {
                warn!(column = name, "column absent, values treated as missing");
            }
            idx
        };
        Self {
            amount: find(columns::AMOUNT),
            sender: find(columns::SENDER),
            recipient: find(columns::RECIPIENT),
        }
    }

    fn amount<'r>(&self, row: &'r EnrichedRow) -> Option<&'r CellValue> {
        self.amount.and_then(|i| row.cells.get(i))
    }

    fn account<'r>(&self, row: &'r EnrichedRow, party: Party) -> Option<&'r CellValue> {
        let idx = match party {
            Party::Sender => self.sender,
            Party::Recipient => self.recipient,
        };
        idx.and_then(|i| row.cells.get(i))
    }
}

/// Grouping key of an account cell. Missing identifiers are never grouped.
fn account_key(cell: &CellValue) -> Option<String> {
    if cell.is_missing() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Sums every flow per account without rounding.
///
/// The map is keyed by account identifier, so accounts come out in
/// lexicographic order; an account appears if it took part in any flow.
pub fn flow_totals(table: &EnrichedTable) -> BTreeMap<String, FlowTotals> {
    let columns = Columns::locate(table);
    let mut totals: BTreeMap<String, FlowTotals> = BTreeMap::new();
    let mut counts = [0usize; Flow::ALL.len()];

    for row in &table.rows {
        let amount = columns.amount(row).map_or_else(Amount::zero, Amount::from_cell);
        for (n, flow) in Flow::ALL.into_iter().enumerate() {
            if !flow.applies(row.sender_kind, row.recipient_kind) {
                continue;
            }
            counts[n] += 1;
            let Some(key) = columns.account(row, flow.party()).and_then(account_key) else {
                continue;
            };
            totals.entry(key).or_default().add(flow, amount);
        }
    }

    for (flow, count) in Flow::ALL.into_iter().zip(counts) {
        info!(flow = flow.label(), transactions = count, "flow selected");
    }
    totals
}

/// Ranks accounts by total received, highest first.
///
/// Ties on the rounded total keep lexicographic account order. An empty table
/// yields an empty ranking.
pub fn rank(table: &EnrichedTable) -> Vec<RankingRow> {
    let mut rows: Vec<RankingRow> = flow_totals(table)
        .into_iter()
        .map(|(account, totals)| totals.into_row(account))
        .collect();

    // Stable sort: accounts arrive in name order.
    rows.sort_by(|a, b| b.total_received.cmp(&a.total_received));
    debug!(accounts = rows.len(), "ranking built");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use monnaie_core::AccountKind::{Individual as U, Professional as P, Vault as C};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn make_table(rows: Vec<(&str, &str, CellValue, AccountKind, AccountKind)>) -> EnrichedTable {
        let header = vec![
            columns::SENDER.to_string(),
            columns::RECIPIENT.to_string(),
            columns::AMOUNT.to_string(),
        ];
        let rows = rows
            .into_iter()
            .map(|(sender, recipient, amount, sk, rk)| EnrichedRow {
                cells: vec![CellValue::text(sender), CellValue::text(recipient), amount],
                sender_kind: sk,
                recipient_kind: rk,
            })
            .collect();
        EnrichedTable::new(header, rows)
    }

    fn row<'a>(ranking: &'a [RankingRow], account: &str) -> &'a RankingRow {
        ranking
            .iter()
            .find(|r| r.account == account)
            .unwrap_or_else(|| panic!("{account} not ranked"))
    }

    // ── flow masks ────────────────────────────────────────────────────────────

    #[test]
    fn flows_partition_by_kind_pair() {
        assert!(Flow::B2bReceived.applies(P, P));
        assert!(Flow::B2bReceived.applies(U, P));
        assert!(!Flow::B2bReceived.applies(C, P));
        assert!(Flow::B2bEmitted.applies(P, P));
        assert!(!Flow::B2bEmitted.applies(U, P));
        assert!(Flow::Remuneration.applies(P, U));
        assert!(Flow::Reconversion.applies(C, P));
        assert!(!Flow::ALL.iter().any(|f| f.applies(U, U)));
        assert!(!Flow::ALL.iter().any(|f| f.applies(P, C)));
    }

    // ── ranking ───────────────────────────────────────────────────────────────

    #[test]
    fn p_to_p_counts_as_received_and_emitted() {
        let table = make_table(vec![("Alice Pro", "Bob Pro", CellValue::Int(100), P, P)]);
        let ranking = rank(&table);

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].account, "Bob Pro");
        assert_eq!(ranking[0].b2b_received, 100);
        assert_eq!(ranking[0].total_received, 100);
        assert_eq!(ranking[1].account, "Alice Pro");
        assert_eq!(ranking[1].b2b_emitted, 100);
        assert_eq!(ranking[1].total_received, 0);
    }

    #[test]
    fn totals_are_ceiled_after_exact_sums() {
        let table = make_table(vec![
            ("Carol", "Shop", CellValue::Number(0.1), U, P),
            ("Dan", "Shop", CellValue::Number(0.2), U, P),
            ("Vault", "Shop", CellValue::text("2.5"), C, P),
        ]);
        let ranking = rank(&table);
        let shop = row(&ranking, "Shop");
        assert_eq!(shop.b2b_received, 1);
        assert_eq!(shop.reconversion, 3);
        assert_eq!(shop.total_received, 4);
        assert_eq!(ranking.len(), 1);
    }

    #[test]
    fn exact_sum_of_tenths_stays_below_next_unit() {
        let cells = (0..10)
            .map(|_| ("Carol", "Shop", CellValue::Number(0.1), U, P))
            .collect();
        let ranking = rank(&make_table(cells));
        // 10 × 0.1 is exactly 1, not 1.0000000000000002.
        assert_eq!(row(&ranking, "Shop").b2b_received, 1);
    }

    #[test]
    fn remuneration_credits_the_sender() {
        let table = make_table(vec![("Shop", "Eve", CellValue::Int(40), P, U)]);
        let ranking = rank(&table);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].account, "Shop");
        assert_eq!(ranking[0].remuneration, 40);
        assert_eq!(ranking[0].total_received, 0);
    }

    #[test]
    fn non_numeric_amounts_count_as_zero() {
        let table = make_table(vec![
            ("Carol", "Shop", CellValue::text("n/a"), U, P),
            ("Carol", "Shop", CellValue::Missing, U, P),
        ]);
        let ranking = rank(&table);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].total_received, 0);
    }

    #[test]
    fn missing_accounts_are_not_grouped() {
        let mut table = make_table(vec![("Carol", "x", CellValue::Int(5), U, P)]);
        table.rows[0].cells[1] = CellValue::Missing;
        assert!(rank(&table).is_empty());
    }

    #[test]
    fn ties_fall_back_to_account_name() {
        let table = make_table(vec![
            ("Carol", "Zeta", CellValue::Int(10), U, P),
            ("Carol", "Alpha", CellValue::Int(10), U, P),
            ("Carol", "Mid", CellValue::Int(30), U, P),
        ]);
        let names: Vec<_> = rank(&table).into_iter().map(|r| r.account).collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn numeric_account_ids_group_by_display_text() {
        let header = vec![
            columns::SENDER.to_string(),
            columns::RECIPIENT.to_string(),
            columns::AMOUNT.to_string(),
        ];
        let rows = vec![
            EnrichedRow {
                cells: vec![CellValue::text("Carol"), CellValue::Int(42), CellValue::Int(3)],
                sender_kind: U,
                recipient_kind: P,
            },
            EnrichedRow {
                cells: vec![CellValue::text("Dan"), CellValue::Number(42.0), CellValue::Int(4)],
                sender_kind: U,
                recipient_kind: P,
            },
        ];
        let ranking = rank(&EnrichedTable::new(header, rows));
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].account, "42");
        assert_eq!(ranking[0].b2b_received, 7);
    }

    #[test]
    fn huge_sums_saturate_instead_of_overflowing() {
        let table = make_table(vec![
            ("Carol", "Shop", CellValue::Number(5e28), U, P),
            ("Dan", "Shop", CellValue::Number(5e28), U, P),
        ]);
        let ranking = rank(&table);
        assert_eq!(ranking[0].b2b_received, i64::MAX);
        assert_eq!(ranking[0].total_received, i64::MAX);
        assert_eq!(flow_totals(&table)["Shop"].b2b_received.as_decimal(), Decimal::MAX);
    }

    #[test]
    fn empty_table_gives_empty_ranking() {
        assert!(rank(&EnrichedTable::default()).is_empty());
    }

    #[test]
    fn missing_amount_column_ranks_zeroes() {
        let header = vec![columns::SENDER.to_string(), columns::RECIPIENT.to_string()];
        let rows = vec![EnrichedRow {
            cells: vec![CellValue::text("Carol"), CellValue::text("Shop")],
            sender_kind: U,
            recipient_kind: P,
        }];
        let ranking = rank(&EnrichedTable::new(header, rows));
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].total_received, 0);
    }

    #[test]
    fn flow_totals_keep_exact_values() {
        let table = make_table(vec![("Carol", "Shop", CellValue::text("12.34"), U, P)]);
        let totals = flow_totals(&table);
        assert_eq!(
            totals["Shop"].b2b_received.as_decimal(),
            Decimal::from_str("12.34").unwrap()
        );
    }

    // ── JSON ──────────────────────────────────────────────────────────────────

    #[test]
    fn ranking_rows_use_display_keys() {
        let table = make_table(vec![("Carol", "Shop", CellValue::Int(5), U, P)]);
        let json = serde_json::to_value(rank(&table)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "Professionnel": "Shop",
                "B2B Reçu": 5,
                "B2B Emis": 0,
                "Rémunération": 0,
                "Reconversion": 0,
                "Total Reçu": 5,
            }])
        );
    }
}
