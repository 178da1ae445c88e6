use monnaie_core::{columns, AccountKind, CellValue, EnrichedRow, EnrichedTable, NormalizedTable};

use crate::catalog::{ClassificationRules, FormatDescriptor, KeywordLists, LabelRule};
use crate::util::{contains_any, fold};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Sender,
    Recipient,
}

/// How one side's value turns into an account kind. Chosen once per format.
#[derive(Debug, Clone, Copy)]
pub enum Strategy<'a> {
    /// Professional keywords, then individual keywords.
    Keywords(&'a KeywordLists),
    /// First matching label, scanned in declaration order, per side.
    LabelMapping {
        sender: &'a [LabelRule],
        recipient: &'a [LabelRule],
    },
    /// Group value preferred over the account name; vault, professional, individual keywords.
    GroupAware {
        keywords: &'a KeywordLists,
        empty_means_vault: bool,
    },
}

impl<'a> Strategy<'a> {
    pub fn for_rules(rules: &'a ClassificationRules) -> Self {
        match rules {
            ClassificationRules::Keywords(keywords) => Strategy::Keywords(keywords),
            ClassificationRules::LabelMapping { sender, recipient } => Strategy::LabelMapping {
                sender,
                recipient,
            },
            ClassificationRules::GroupAware {
                keywords,
                empty_means_vault,
                ..
            } => Strategy::GroupAware {
                keywords,
                empty_means_vault: *empty_means_vault,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Keywords(_) => "keywords",
            Strategy::LabelMapping { .. } => "label-mapping",
            Strategy::GroupAware { .. } => "group-aware",
        }
    }

    /// Classifies one side. Never fails: anything unmatched, and any non-text
    /// input, is `Vault`.
    pub fn classify_side(&self, side: Side, value: &CellValue, group: Option<&CellValue>) -> AccountKind {
        match *self {
            Strategy::Keywords(keywords) => value
                .as_text()
                .map_or(AccountKind::Vault, |text| keyword_kind(keywords, text)),
            Strategy::LabelMapping { sender, recipient } => {
                let rules = match side {
                    Side::Sender => sender,
                    Side::Recipient => recipient,
                };
                value
                    .as_text()
                    .map_or(AccountKind::Vault, |text| label_kind(rules, text))
            }
            Strategy::GroupAware {
                keywords,
                empty_means_vault,
            } => {
                let chosen = match group {
                    Some(g) if g.as_text().is_some_and(|s| !s.trim().is_empty()) => g,
                    _ => value,
                };
                if empty_means_vault && chosen.is_blank() {
                    return AccountKind::Vault;
                }
                chosen
                    .as_text()
                    .map_or(AccountKind::Vault, |text| keyword_kind(keywords, text))
            }
        }
    }
}

fn keyword_kind(keywords: &KeywordLists, text: &str) -> AccountKind {
    let folded = fold(text);
    if contains_any(&folded, &keywords.vault) {
        AccountKind::Vault
    } else if contains_any(&folded, &keywords.professional) {
        AccountKind::Professional
    } else if contains_any(&folded, &keywords.individual) {
        AccountKind::Individual
    } else {
        AccountKind::Vault
    }
}

fn label_kind(rules: &[LabelRule], text: &str) -> AccountKind {
    let folded = fold(text);
    rules
        .iter()
        .find(|rule| folded.contains(rule.pattern.as_str()))
        .map_or(AccountKind::Vault, |rule| rule.kind)
}

/// A format's strategy bound to the column positions of a normalized header.
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    strategy: Strategy<'a>,
    sender: Option<usize>,
    recipient: Option<usize>,
    sender_group: Option<usize>,
    recipient_group: Option<usize>,
}

impl<'a> Classifier<'a> {
    pub fn new(descriptor: &'a FormatDescriptor, header: &[String]) -> Self {
        let position = |name: &str| header.iter().position(|h| h == name);
        let (sender_group, recipient_group) = match &descriptor.rules {
            ClassificationRules::GroupAware {
                sender_group,
                recipient_group,
                ..
            } => (
                sender_group.as_deref().and_then(position),
                recipient_group.as_deref().and_then(position),
            ),
            _ => (None, None),
        };
        Self {
            strategy: Strategy::for_rules(&descriptor.rules),
            sender: position(columns::SENDER),
            recipient: position(columns::RECIPIENT),
            sender_group,
            recipient_group,
        }
    }

    pub fn strategy(&self) -> Strategy<'a> {
        self.strategy
    }

    /// Classifies the sender and recipient of one normalized row.
    pub fn classify_row(&self, row: &[CellValue]) -> (AccountKind, AccountKind) {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
        let missing = CellValue::Missing;
        let sender = self.strategy.classify_side(
            Side::Sender,
            cell(self.sender).unwrap_or(&missing),
            cell(self.sender_group),
        );
        let recipient = self.strategy.classify_side(
            Side::Recipient,
            cell(self.recipient).unwrap_or(&missing),
            cell(self.recipient_group),
        );
        (sender, recipient)
    }
}

/// Classifies a sender/recipient pair without any group context.
pub fn classify(
    sender: &CellValue,
    recipient: &CellValue,
    descriptor: &FormatDescriptor,
) -> (AccountKind, AccountKind) {
    let strategy = Strategy::for_rules(&descriptor.rules);
    (
        strategy.classify_side(Side::Sender, sender, None),
        strategy.classify_side(Side::Recipient, recipient, None),
    )
}

/// Adds both account kinds to every row of a normalized table.
pub fn enrich(table: NormalizedTable, descriptor: &FormatDescriptor) -> EnrichedTable {
    let classifier = Classifier::new(descriptor, &table.header);
    tracing::debug!(
        format = %descriptor.name,
        strategy = classifier.strategy().name(),
        "classifier selected"
    );

    let rows = table
        .rows
        .into_iter()
        .map(|cells| {
            let (sender_kind, recipient_kind) = classifier.classify_row(&cells);
            EnrichedRow {
                cells,
                sender_kind,
                recipient_kind,
            }
        })
        .collect();

    EnrichedTable::new(table.header, rows)
}
