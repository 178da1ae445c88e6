use monnaie_core::{AccountKind, EnrichedRow, EnrichedTable};
use tracing::debug;

/// Hides transactions that touch a vault account on the chosen side(s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultFilter {
    pub ignore_vault_sender: bool,
    pub ignore_vault_recipient: bool,
}

impl VaultFilter {
    pub fn new(ignore_vault_sender: bool, ignore_vault_recipient: bool) -> Self {
        Self {
            ignore_vault_sender,
            ignore_vault_recipient,
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.ignore_vault_sender && !self.ignore_vault_recipient
    }

    pub fn keeps(&self, row: &EnrichedRow) -> bool {
        !(self.ignore_vault_sender && row.sender_kind == AccountKind::Vault
            || self.ignore_vault_recipient && row.recipient_kind == AccountKind::Vault)
    }

    pub fn apply(&self, table: &EnrichedTable) -> EnrichedTable {
        if self.is_noop() {
            return table.clone();
        }
        let filtered = table.filtered(|row| self.keeps(row));
        debug!(
            kept = filtered.len(),
            dropped = table.len() - filtered.len(),
            "vault filter applied"
        );
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monnaie_core::AccountKind::{Individual as U, Professional as P, Vault as C};
    use monnaie_core::CellValue;

    fn make_table(kinds: &[(AccountKind, AccountKind)]) -> EnrichedTable {
        let rows = kinds
            .iter()
            .enumerate()
            .map(|(i, (sk, rk))| EnrichedRow {
                cells: vec![CellValue::Int(i as i64)],
                sender_kind: *sk,
                recipient_kind: *rk,
            })
            .collect();
        EnrichedTable::new(vec!["n".into()], rows)
    }

    #[test]
    fn default_keeps_everything() {
        let table = make_table(&[(C, P), (P, C), (U, P)]);
        assert!(VaultFilter::default().is_noop());
        assert_eq!(VaultFilter::default().apply(&table), table);
    }

    #[test]
    fn ignores_vault_senders() {
        let table = make_table(&[(C, P), (P, C), (U, P)]);
        let filtered = VaultFilter::new(true, false).apply(&table);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.rows.iter().all(|r| r.sender_kind != C));
    }

    #[test]
    fn ignores_both_sides() {
        let table = make_table(&[(C, P), (P, C), (U, P), (C, C)]);
        let filtered = VaultFilter::new(true, true).apply(&table);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].cells[0], CellValue::Int(2));
        assert_eq!(filtered.header, table.header);
    }
}
