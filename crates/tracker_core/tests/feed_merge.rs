use pretty_assertions::assert_eq;
use tracker_core::{merge_feed, FeedItem, Highlight, TickerMessage, FEED_CAPACITY};

fn highlights(texts: &[&str]) -> Vec<Highlight> {
    texts.iter().map(|t| Highlight::new(*t)).collect()
}

fn ticker(items: &[(u64, &str)]) -> Vec<TickerMessage> {
    items
        .iter()
        .map(|(id, text)| TickerMessage {
            id: *id,
            text: text.to_string(),
        })
        .collect()
}

#[test]
fn highlights_newest_first_then_ticker() {
    let feed = merge_feed(
        &highlights(&["h1", "h2", "h3"]),
        &ticker(&[(5, "t5"), (4, "t4")]),
    );

    let keyed: Vec<(i64, &str)> = feed.iter().map(|i| (i.display_id(), i.text())).collect();
    assert_eq!(
        keyed,
        vec![(-1, "h3"), (-2, "h2"), (-3, "h1"), (5, "t5"), (4, "t4")]
    );
    assert!(feed[0].is_highlight());
    assert!(!feed[3].is_highlight());
}

#[test]
fn feed_is_capped_and_highlights_win() {
    let many: Vec<String> = (1..=7).map(|n| format!("h{n}")).collect();
    let refs: Vec<&str> = many.iter().map(String::as_str).collect();
    let feed = merge_feed(
        &highlights(&refs),
        &ticker(&[(3, "t3"), (2, "t2"), (1, "t1")]),
    );

    assert_eq!(feed.len(), FEED_CAPACITY);
    assert_eq!(
        feed.last(),
        Some(&FeedItem::Ticker {
            id: 3,
            text: "t3".to_string()
        })
    );
    assert_eq!(
        feed.first(),
        Some(&FeedItem::Highlight {
            rank: 1,
            text: "h7".to_string()
        })
    );
}

#[test]
fn merge_is_deterministic() {
    let h = highlights(&["a", "b"]);
    let t = ticker(&[(9, "x")]);
    assert_eq!(merge_feed(&h, &t), merge_feed(&h, &t));
    let none: Vec<TickerMessage> = Vec::new();
    assert!(merge_feed(&[], &none).is_empty());
}
