use pretty_assertions::assert_eq;
use shelf_core::{ArticleRecord, ReadingListPage, PER_PAGE};

fn init_logging() {
    shelf_logging::initialize_for_tests();
}

fn record(n: usize) -> ArticleRecord {
    let id = format!("id-{n:03}");
    ArticleRecord {
        filename: ArticleRecord::filename_for(&id),
        id,
        title: format!("Article {n}"),
        url: format!("https://www.example.com/{n}"),
        domain: "example.com".to_string(),
        // Minutes advance with n, so a higher n is newer.
        saved_at: format!("2024-02-01T{:02}:{:02}:00.000000", n / 60, n % 60),
    }
}

#[test]
fn empty_list_has_one_empty_page() {
    init_logging();
    let page = ReadingListPage::build(Vec::new(), 1);
    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.page, 1);
    assert!(page.rows.is_empty());
    assert!(!page.has_prev);
    assert!(!page.has_next);
}

#[test]
fn first_page_shows_newest_twenty() {
    init_logging();
    let records: Vec<_> = (0..45).map(record).collect();
    let page = ReadingListPage::build(records, 1);

    assert_eq!(page.total, 45);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.rows.len(), PER_PAGE);
    assert_eq!(page.rows[0].id, "id-044");
    assert_eq!(page.rows[PER_PAGE - 1].id, "id-025");
    assert_eq!(page.rows[0].formatted_date, "Feb 01, 2024");
    assert!(!page.has_prev);
    assert!(page.has_next);
}

#[test]
fn last_page_holds_remainder() {
    init_logging();
    let records: Vec<_> = (0..45).map(record).collect();
    let page = ReadingListPage::build(records, 3);

    assert_eq!(page.rows.len(), 5);
    assert_eq!(page.rows[4].id, "id-000");
    assert!(page.has_prev);
    assert!(!page.has_next);
}

#[test]
fn out_of_range_page_is_clamped() {
    init_logging();
    let records: Vec<_> = (0..21).map(record).collect();

    let beyond = ReadingListPage::build(records.clone(), 99);
    assert_eq!(beyond.page, 2);
    assert_eq!(beyond.rows.len(), 1);

    let zero = ReadingListPage::build(records, 0);
    assert_eq!(zero.page, 1);
    assert_eq!(zero.rows.len(), PER_PAGE);
}

#[test]
fn manifest_json_keys_are_stable() {
    init_logging();
    let json = serde_json::to_value(record(7)).unwrap();
    let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["domain", "filename", "id", "saved_at", "title", "url"]
    );
}
