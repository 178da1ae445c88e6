use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account type assigned to each side of a transaction.
///
/// Serialized as its one-letter symbol, which is also the value stored in the
/// `Type_Expéditeur` / `Type_Destinataire` columns of a standardized dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    #[serde(rename = "P")]
    Professional,
    #[serde(rename = "U")]
    Individual,
    /// Reserve or system account, and the fallback for anything unclassified.
    #[serde(rename = "C")]
    Vault,
}

impl AccountKind {
    pub fn symbol(self) -> &'static str {
        match self {
            AccountKind::Professional => "P",
            AccountKind::Individual => "U",
            AccountKind::Vault => "C",
        }
    }

    /// Maps a category label used in platform rule files
    /// (`Professionnel`, `Particulier`, `Coffre`), case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "professionnel" => Some(AccountKind::Professional),
            "particulier" => Some(AccountKind::Individual),
            "coffre" => Some(AccountKind::Vault),
            _ => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "P" => Ok(AccountKind::Professional),
            "U" => Ok(AccountKind::Individual),
            "C" => Ok(AccountKind::Vault),
            other => Err(format!("Unknown account kind: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip_through_from_str() {
        for kind in [AccountKind::Professional, AccountKind::Individual, AccountKind::Vault] {
            assert_eq!(kind.symbol().parse::<AccountKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        assert!("X".parse::<AccountKind>().is_err());
        assert!("".parse::<AccountKind>().is_err());
    }

    #[test]
    fn labels_are_case_insensitive() {
        assert_eq!(AccountKind::from_label("Professionnel"), Some(AccountKind::Professional));
        assert_eq!(AccountKind::from_label(" PARTICULIER "), Some(AccountKind::Individual));
        assert_eq!(AccountKind::from_label("coffre"), Some(AccountKind::Vault));
        assert_eq!(AccountKind::from_label("association"), None);
    }

    #[test]
    fn serializes_as_symbol() {
        assert_eq!(serde_json::to_string(&AccountKind::Individual).unwrap(), "\"U\"");
        let kind: AccountKind = serde_json::from_str("\"C\"").unwrap();
        assert_eq!(kind, AccountKind::Vault);
    }
}
