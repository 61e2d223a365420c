// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Search / Projection Layer
//!
//! Read-only, non-persisted projections over decrypted titles and
//! subtitles with highlight spans. Nothing here mutates the cache, and no
//! projection outlives the query that built it.
//!
//! Corrupted rows are skipped and reported per row; one bad record never
//! fails a whole query.

use std::collections::HashSet;

use tracing::warn;

use crate::item::{ItemKind, ItemState};
use crate::storage::{Storage, StorageError};

/// Result ordering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSort {
    /// By `max(last_use_time, modify_time)` descending.
    #[default]
    MostRecent,
    /// By title, case-insensitive.
    Alphabetical,
}

/// A text fragment with the byte ranges that matched the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HighlightedText {
    pub text: String,
    /// Half-open `(start, end)` byte ranges into `text`.
    pub matched: Vec<(usize, usize)>,
}

/// One search hit.
///
/// Identity for deduplication is `(item_id, share_id)` plus the
/// highlighted fragments: the same item matched differently is a distinct
/// result, the same item matched identically is a duplicate.
#[derive(Debug, Clone)]
pub struct ItemSearchResult {
    pub item_id: String,
    pub share_id: String,
    pub kind: ItemKind,
    pub title: HighlightedText,
    pub subtitle: Option<HighlightedText>,
    pub pinned: bool,
    /// `max(last_use_time, modify_time)`, for recency ordering.
    pub ranking_time: i64,
}

impl PartialEq for ItemSearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.item_id == other.item_id
            && self.share_id == other.share_id
            && self.title == other.title
            && self.subtitle == other.subtitle
    }
}

impl Eq for ItemSearchResult {}

impl std::hash::Hash for ItemSearchResult {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.item_id.hash(state);
        self.share_id.hash(state);
        self.title.hash(state);
        self.subtitle.hash(state);
    }
}

/// Outcome of a search pass: results plus the rows that had to be
/// skipped as detected corruption.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub results: Vec<ItemSearchResult>,
    /// `(share_id, item_id)` of rows that failed decryption.
    pub corrupted: Vec<(String, String)>,
}

/// Builds search projections over the encrypted cache.
pub struct ItemSearcher<'a> {
    storage: &'a Storage,
}

impl<'a> ItemSearcher<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        ItemSearcher { storage }
    }

    /// Runs a case-insensitive substring query over decrypted titles and
    /// subtitles. An empty query lists everything, unhighlighted.
    ///
    /// Trashed items are excluded. Corrupted rows are skipped, reported in
    /// the returned [`SearchReport`], and logged.
    pub fn search(
        &self,
        user_id: &str,
        query: &str,
        sort: SearchSort,
    ) -> Result<SearchReport, StorageError> {
        let mut report = SearchReport::default();
        let mut seen: HashSet<ItemSearchResult> = HashSet::new();

        for item in self.storage.get_all_items(user_id)? {
            if item.revision.state == ItemState::Trashed {
                continue;
            }

            let content = match self.storage.decrypt_item_content(&item) {
                Ok(content) => content,
                Err(e) if e.is_corrupted_record() => {
                    warn!(
                        share_id = %item.share_id,
                        item_id = %item.revision.item_id,
                        "skipping corrupted cache row"
                    );
                    report
                        .corrupted
                        .push((item.share_id.clone(), item.revision.item_id.clone()));
                    continue;
                }
                Err(e) => return Err(e),
            };

            let title_matches = match_ranges(content.title(), query);
            let subtitle = content.subtitle();
            let subtitle_matches = subtitle.map(|s| match_ranges(s, query));

            let matched = query.is_empty()
                || !title_matches.is_empty()
                || subtitle_matches
                    .as_ref()
                    .is_some_and(|m| !m.is_empty());
            if !matched {
                continue;
            }

            let result = ItemSearchResult {
                item_id: item.revision.item_id.clone(),
                share_id: item.share_id.clone(),
                kind: content.kind(),
                title: HighlightedText {
                    text: content.title().to_string(),
                    matched: title_matches,
                },
                subtitle: subtitle.map(|s| HighlightedText {
                    text: s.to_string(),
                    matched: subtitle_matches.unwrap_or_default(),
                }),
                pinned: item.revision.pinned,
                ranking_time: item.revision.ranking_time(),
            };

            if seen.insert(result.clone()) {
                report.results.push(result);
            }
        }

        sort_results(&mut report.results, sort);
        Ok(report)
    }

    /// Lists every non-trashed item, unhighlighted.
    pub fn list(&self, user_id: &str, sort: SearchSort) -> Result<SearchReport, StorageError> {
        self.search(user_id, "", sort)
    }
}

fn sort_results(results: &mut [ItemSearchResult], sort: SearchSort) {
    match sort {
        SearchSort::MostRecent => {
            results.sort_by(|a, b| {
                b.ranking_time
                    .cmp(&a.ranking_time)
                    .then_with(|| a.item_id.cmp(&b.item_id))
            });
        }
        SearchSort::Alphabetical => {
            results.sort_by(|a, b| {
                a.title
                    .text
                    .to_lowercase()
                    .cmp(&b.title.text.to_lowercase())
                    .then_with(|| a.item_id.cmp(&b.item_id))
            });
        }
    }
}

/// All case-insensitive occurrences of `needle` in `haystack`, as byte
/// ranges into the original string. Empty needle matches nothing.
fn match_ranges(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }

    // Case-fold into a shadow string while keeping, for every folded
    // byte, the byte range of the source character it came from.
    let mut folded = String::new();
    let mut origin: Vec<(usize, usize)> = Vec::new();
    for (start, c) in haystack.char_indices() {
        let end = start + c.len_utf8();
        for lc in c.to_lowercase() {
            let mut buf = [0u8; 4];
            let encoded = lc.encode_utf8(&mut buf);
            for _ in 0..encoded.len() {
                origin.push((start, end));
            }
            folded.push(lc);
        }
    }

    let needle_folded = needle.to_lowercase();
    let mut ranges = Vec::new();
    let mut search_from = 0;
    while let Some(pos) = folded[search_from..].find(&needle_folded) {
        let begin = search_from + pos;
        let last = begin + needle_folded.len() - 1;
        ranges.push((origin[begin].0, origin[last].1));
        search_from = begin + needle_folded.len();
    }
    ranges
}
