//! PostgreSQL-to-SQLite dialect rewriting.
//!
//! Call sites write `$1`, `$2`, ... placeholders (1-based, reusable, any order) together with
//! `NOW()`, `ILIKE` and `TO_CHAR`. [`translate`] turns that text into SQL `SQLite` accepts, and
//! [`reorder_params`] lays the caller's parameters out in the order the resulting `?` markers
//! appear.

use std::borrow::Cow;
use std::collections::BTreeMap;

mod rules;
mod scanner;

use crate::types::RowValues;

/// Output slot assigned to each distinct `$N`, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    slots: BTreeMap<usize, usize>,
    placeholder_count: usize,
}

impl PlaceholderMap {
    /// Slot (1-based) given to `$index` when it was first seen.
    #[must_use]
    pub fn slot_for(&self, index: usize) -> Option<usize> {
        self.slots.get(&index).copied()
    }

    /// Number of distinct `$N` markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of `?` markers emitted, counting repeats.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholder_count
    }
}

/// Result of [`translate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated<'a> {
    pub sql: Cow<'a, str>,
    pub placeholder_map: PlaceholderMap,
}

/// A statement ready for a backend driver: rewritten SQL plus parameters in `?` order.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedStatement {
    pub sql: String,
    pub params: Vec<RowValues>,
    pub placeholder_map: PlaceholderMap,
}

/// Rewrite PostgreSQL-dialect SQL into `SQLite` SQL.
///
/// Returns a borrowed `Cow` when nothing needed rewriting, so SQLite-dialect input passes
/// through unchanged.
///
/// ```rust
/// use sqlite_pg_compat::translation::translate;
///
/// let out = translate("SELECT * FROM alunos WHERE nome ILIKE $1");
/// assert_eq!(out.sql, "SELECT * FROM alunos WHERE UPPER(nome) LIKE UPPER(?)");
/// ```
#[must_use]
pub fn translate(sql: &str) -> Translated<'_> {
    let rewritten = rules::rewrite_functions(sql);
    let markers = scanner::dollar_placeholders(&rewritten);

    let mut placeholder_map = PlaceholderMap::default();
    if markers.is_empty() {
        return Translated {
            sql: rewritten,
            placeholder_map,
        };
    }

    let mut out = String::with_capacity(rewritten.len());
    let mut copied = 0;
    for marker in &markers {
        out.push_str(&rewritten[copied..marker.start]);
        out.push('?');
        copied = marker.end;

        let next_slot = placeholder_map.slots.len() + 1;
        placeholder_map.slots.entry(marker.index).or_insert(next_slot);
        placeholder_map.placeholder_count += 1;
    }
    out.push_str(&rewritten[copied..]);

    Translated {
        sql: Cow::Owned(out),
        placeholder_map,
    }
}

/// Project `params` onto the `$N` markers of the original, untranslated `sql`.
///
/// One value is emitted per marker occurrence, in source order, so a parameter referenced twice
/// is bound twice and `$2 ... $1` binds the second value first. SQL without `$N` markers (already
/// `?`-style) gets `params` back unchanged. A marker with no matching value is dropped, which
/// leaves the driver to report the count mismatch.
#[must_use]
pub fn reorder_params(sql: &str, params: &[RowValues]) -> Vec<RowValues> {
    let markers = scanner::dollar_placeholders(sql);
    if markers.is_empty() {
        return params.to_vec();
    }
    markers
        .iter()
        .filter_map(|marker| {
            marker
                .index
                .checked_sub(1)
                .and_then(|i| params.get(i))
                .cloned()
        })
        .collect()
}

/// [`translate`] and [`reorder_params`] in one step.
#[must_use]
pub fn translate_statement(sql: &str, params: &[RowValues]) -> TranslatedStatement {
    let translated = translate(sql);
    TranslatedStatement {
        sql: translated.sql.into_owned(),
        params: reorder_params(sql, params),
        placeholder_map: translated.placeholder_map,
    }
}
