//! Best-guess column per role, from column names only.
//!
//! Keywords are tried in priority order; for each keyword the columns are
//! scanned left to right and the first whose lower-cased name contains the
//! keyword wins. No match is a normal outcome (`None`), the caller decides the
//! fallback.

use std::collections::BTreeMap;

use polars::frame::DataFrame;

use crate::models::ColumnRole;

pub type KeywordTable = BTreeMap<ColumnRole, Vec<String>>;
pub type Resolution = BTreeMap<ColumnRole, Option<String>>;

const TERM_KEYWORDS: &[&str] = &["term", "pathway", "description", "category", "name"];
const RATIO_KEYWORDS: &[&str] = &[
    "generatio",
    "gene_ratio",
    "gene ratio",
    "ratio",
    "percent",
    "%",
    "pct",
];
const SIGNIFICANCE_KEYWORDS: &[&str] = &[
    "p.adjust",
    "padj",
    "fdr",
    "adjusted",
    "qvalue",
    "q-value",
    "pvalue",
    "p-value",
    "p_value",
    "pval",
];
const COUNT_KEYWORDS: &[&str] = &["count", "size", "overlap", "hits"];

/// Keyword table covering DAVID, clusterProfiler, g:Profiler and Enrichr exports.
pub fn default_keywords() -> KeywordTable {
    let to_owned = |kws: &[&str]| kws.iter().map(|k| k.to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        (ColumnRole::Term, to_owned(TERM_KEYWORDS)),
        (ColumnRole::PercentOrRatio, to_owned(RATIO_KEYWORDS)),
        (ColumnRole::Significance, to_owned(SIGNIFICANCE_KEYWORDS)),
        (ColumnRole::Count, to_owned(COUNT_KEYWORDS)),
    ])
}

fn find_column(available: &[String], keywords: &[String]) -> Option<String> {
    let lowered: Vec<String> = available.iter().map(|c| c.to_lowercase()).collect();
    keywords.iter().find_map(|kw| {
        let kw = kw.to_lowercase();
        lowered
            .iter()
            .position(|name| name.contains(&kw))
            .map(|idx| available[idx].clone())
    })
}

pub fn resolve(available: &[String], keywords: &KeywordTable) -> Resolution {
    ColumnRole::ALL
        .iter()
        .map(|role| {
            let found = keywords
                .get(role)
                .and_then(|kws| find_column(available, kws));
            (*role, found)
        })
        .collect()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|c| c.to_string()).collect()
}

/// [`resolve`] with the default keyword table over a loaded table.
pub fn resolve_frame(df: &DataFrame) -> Resolution {
    resolve(&column_names(df), &default_keywords())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn david_export_columns() {
        let cols = names(&[
            "Category", "Term", "Count", "%", "PValue", "Genes", "List Total", "Fold Enrichment",
            "Bonferroni", "Benjamini", "FDR",
        ]);
        let r = resolve(&cols, &default_keywords());
        assert_eq!(r[&ColumnRole::Term].as_deref(), Some("Term"));
        assert_eq!(r[&ColumnRole::PercentOrRatio].as_deref(), Some("%"));
        assert_eq!(r[&ColumnRole::Significance].as_deref(), Some("FDR"));
        assert_eq!(r[&ColumnRole::Count].as_deref(), Some("Count"));
    }

    #[test]
    fn cluster_profiler_export_columns() {
        let cols = names(&[
            "ID", "Description", "GeneRatio", "BgRatio", "pvalue", "p.adjust", "qvalue", "geneID",
            "Count",
        ]);
        let r = resolve(&cols, &default_keywords());
        assert_eq!(r[&ColumnRole::Term].as_deref(), Some("Description"));
        assert_eq!(r[&ColumnRole::PercentOrRatio].as_deref(), Some("GeneRatio"));
        assert_eq!(r[&ColumnRole::Significance].as_deref(), Some("p.adjust"));
        assert_eq!(r[&ColumnRole::Count].as_deref(), Some("Count"));
    }

    #[test]
    fn keyword_priority_beats_column_order() {
        let cols = names(&["raw pvalue", "Adjusted P"]);
        let mut table = KeywordTable::new();
        table.insert(ColumnRole::Significance, names(&["adjusted", "pvalue"]));
        let r = resolve(&cols, &table);
        assert_eq!(r[&ColumnRole::Significance].as_deref(), Some("Adjusted P"));
    }

    #[test]
    fn first_matching_column_wins_for_one_keyword() {
        let cols = names(&["Pathway_ID", "Pathway_Name"]);
        let r = resolve(&cols, &default_keywords());
        assert_eq!(r[&ColumnRole::Term].as_deref(), Some("Pathway_ID"));
    }

    #[test]
    fn matching_ignores_case() {
        let cols = names(&["KEGGPATHWAYS", "COUNT"]);
        let r = resolve(&cols, &default_keywords());
        assert_eq!(r[&ColumnRole::Term].as_deref(), Some("KEGGPATHWAYS"));
        assert_eq!(r[&ColumnRole::Count].as_deref(), Some("COUNT"));
    }

    #[test]
    fn no_match_resolves_to_none() {
        let cols = names(&["a", "b"]);
        let r = resolve(&cols, &default_keywords());
        assert_eq!(r.len(), 4);
        assert!(r.values().all(|v| v.is_none()));
    }

    #[test]
    fn resolution_is_deterministic() {
        let cols = names(&["Term", "Ratio", "Padj", "Count", "Overlap"]);
        let kws = default_keywords();
        let first = resolve(&cols, &kws);
        for _ in 0..5 {
            assert_eq!(resolve(&cols, &kws), first);
        }
    }
}
