//! Cross-site summary table

use crate::ordered_map::OrderedMap;
use serde::{Deserialize, Serialize};

/// Per-wiki counts and totals for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub entries: OrderedMap<usize>,
    pub total_pages: usize,
    pub total_wikis: usize,
}

/// Build the summary table from dbname → count, dropping zero counts
pub fn summary_table(counts: &OrderedMap<usize>) -> SummaryTable {
    let entries: OrderedMap<usize> = counts
        .iter()
        .filter(|(_, count)| **count != 0)
        .map(|(dbname, count)| (dbname.to_string(), *count))
        .collect();

    SummaryTable {
        total_pages: entries.values().sum(),
        total_wikis: entries.len(),
        entries,
    }
}
