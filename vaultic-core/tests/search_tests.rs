//! Tests for the search/projection layer.

mod common;

use common::{cache_row, login_content, test_storage, unlocked_provider, USER};
use vaultic_core::item::EncryptedItem;
use vaultic_core::{
    HighlightedText, ItemContent, ItemKind, ItemSearchResult, ItemSearcher, ItemState, Storage,
};

fn seed(storage: &Storage, rows: Vec<EncryptedItem>) {
    storage.upsert_items(&rows, USER).unwrap();
}

fn result(
    item_id: &str,
    share_id: &str,
    title: HighlightedText,
    subtitle: Option<HighlightedText>,
) -> ItemSearchResult {
    ItemSearchResult {
        item_id: item_id.to_string(),
        share_id: share_id.to_string(),
        kind: ItemKind::Login,
        title,
        subtitle,
        pinned: false,
        ranking_time: 0,
    }
}

#[test]
fn test_substring_match_with_highlight_ranges() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    seed(
        &storage,
        vec![
            cache_row(&storage, "share-1", "item-1", 1, &login_content("GitHub Login", "octocat")),
            cache_row(&storage, "share-1", "item-2", 1, &login_content("Bank", "alice")),
        ],
    );

    let report = ItemSearcher::new(&storage)
        .search(USER, "hub", Default::default())
        .unwrap();

    assert_eq!(report.results.len(), 1);
    let hit = &report.results[0];
    assert_eq!(hit.item_id, "item-1");
    assert_eq!(hit.title.text, "GitHub Login");
    assert_eq!(hit.title.matched, vec![(3, 6)]);
    assert!(report.corrupted.is_empty());
}

#[test]
fn test_match_is_case_insensitive_and_covers_subtitle() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    seed(
        &storage,
        vec![cache_row(
            &storage,
            "share-1",
            "item-1",
            1,
            &login_content("Bank", "OCTOCAT"),
        )],
    );

    let report = ItemSearcher::new(&storage)
        .search(USER, "octo", Default::default())
        .unwrap();

    assert_eq!(report.results.len(), 1);
    let subtitle = report.results[0].subtitle.as_ref().unwrap();
    assert_eq!(subtitle.matched, vec![(0, 4)]);
}

#[test]
fn test_dedup_identity_includes_highlighted_fragments() {
    let title_a = HighlightedText {
        text: "GitHub".to_string(),
        matched: vec![(0, 3)],
    };
    let title_b = HighlightedText {
        text: "GitHub".to_string(),
        matched: vec![(3, 6)],
    };

    // Same identity, same fragments: duplicates.
    assert_eq!(
        result("item-1", "share-1", title_a.clone(), None),
        result("item-1", "share-1", title_a.clone(), None)
    );

    // Same identity, different fragments: distinct results.
    assert_ne!(
        result("item-1", "share-1", title_a.clone(), None),
        result("item-1", "share-1", title_b, None)
    );

    // Different identity, same fragments: distinct results.
    assert_ne!(
        result("item-1", "share-1", title_a.clone(), None),
        result("item-1", "share-2", title_a, None)
    );
}

#[test]
fn test_most_recent_sort_uses_last_use_or_modify() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let mut old = cache_row(&storage, "share-1", "item-old", 1, &login_content("Old", "u"));
    old.revision.modify_time = 100;
    let mut used = cache_row(&storage, "share-1", "item-used", 1, &login_content("Used", "u"));
    used.revision.modify_time = 50;
    used.revision.last_use_time = Some(500);
    let mut fresh = cache_row(&storage, "share-1", "item-fresh", 1, &login_content("Fresh", "u"));
    fresh.revision.modify_time = 300;
    seed(&storage, vec![old, used, fresh]);

    let report = ItemSearcher::new(&storage)
        .list(USER, Default::default())
        .unwrap();
    let ids: Vec<&str> = report.results.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(ids, ["item-used", "item-fresh", "item-old"]);
}

#[test]
fn test_alphabetical_sort_mode() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    seed(
        &storage,
        vec![
            cache_row(&storage, "share-1", "item-1", 1, &login_content("banana", "u")),
            cache_row(&storage, "share-1", "item-2", 1, &login_content("Apple", "u")),
            cache_row(&storage, "share-1", "item-3", 1, &login_content("cherry", "u")),
        ],
    );

    let report = ItemSearcher::new(&storage)
        .list(USER, vaultic_core::SearchSort::Alphabetical)
        .unwrap();
    let titles: Vec<&str> = report
        .results
        .iter()
        .map(|r| r.title.text.as_str())
        .collect();
    assert_eq!(titles, ["Apple", "banana", "cherry"]);
}

#[test]
fn test_trashed_items_are_excluded() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let mut trashed = cache_row(&storage, "share-1", "item-t", 1, &login_content("Gone", "u"));
    trashed.revision.state = ItemState::Trashed;
    seed(
        &storage,
        vec![
            trashed,
            cache_row(&storage, "share-1", "item-a", 1, &login_content("Here", "u")),
        ],
    );

    let report = ItemSearcher::new(&storage)
        .list(USER, Default::default())
        .unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].item_id, "item-a");
}

#[test]
fn test_one_corrupted_row_among_ten_degrades_gracefully() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let mut rows = Vec::new();
    for i in 0..10 {
        let id = format!("item-{}", i);
        rows.push(cache_row(&storage, "share-1", &id, 1, &login_content(&id, "u")));
    }
    rows[4].encrypted_content = vec![0u8; 64];
    seed(&storage, rows);

    let report = ItemSearcher::new(&storage)
        .list(USER, Default::default())
        .unwrap();

    assert_eq!(report.results.len(), 9);
    assert_eq!(
        report.corrupted,
        vec![("share-1".to_string(), "item-4".to_string())]
    );
}

#[test]
fn test_note_subtitle_is_absent() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let note = ItemContent::Note {
        title: "Wifi".to_string(),
        text: "on the router".to_string(),
    };
    let mut row = cache_row(&storage, "share-1", "item-1", 1, &note);
    row.is_login_item = false;
    seed(&storage, vec![row]);

    let report = ItemSearcher::new(&storage)
        .search(USER, "wifi", Default::default())
        .unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].kind, ItemKind::Note);
    assert!(report.results[0].subtitle.is_none());
}
