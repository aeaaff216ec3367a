use driftnet_engine::{clean_title, parse_feed, FeedEntry};
use pretty_assertions::assert_eq;

#[test]
fn rss_items_yield_title_and_link() {
    let doc = br#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Chan</title>
    <item><title>First</title><link>http://a.com/p</link></item>
    <item><title>Second</title><link>http://a.com/q</link></item>
  </channel>
</rss>"#;
    let entries = parse_feed(doc).expect("parse ok");
    assert_eq!(
        entries,
        vec![
            FeedEntry {
                title: "First".to_string(),
                link: "http://a.com/p".to_string(),
            },
            FeedEntry {
                title: "Second".to_string(),
                link: "http://a.com/q".to_string(),
            },
        ]
    );
}

#[test]
fn rss_cdata_titles_are_read() {
    let doc = br#"<rss><channel>
      <item><title><![CDATA[A <b>bold</b> one]]></title><link>http://a.com/x</link></item>
    </channel></rss>"#;
    let entries = parse_feed(doc).expect("parse ok");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "A <b>bold</b> one");
}

#[test]
fn rss_entry_without_link_is_skipped_not_fatal() {
    let doc = br#"<rss><channel>
      <item><title>No link here</title></item>
      <item><title>Good</title><link>http://a.com/ok</link></item>
    </channel></rss>"#;
    let entries = parse_feed(doc).expect("parse ok");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].link, "http://a.com/ok");
}

#[test]
fn atom_entries_are_used_when_no_rss_items_exist() {
    let doc = br#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Feed</title>
  <entry>
    <title>Atom post</title>
    <link href="http://b.com/post" rel="alternate"/>
  </entry>
</feed>"#;
    let entries = parse_feed(doc).expect("parse ok");
    assert_eq!(
        entries,
        vec![FeedEntry {
            title: "Atom post".to_string(),
            link: "http://b.com/post".to_string(),
        }]
    );
}

#[test]
fn atom_link_takes_the_first_href() {
    let doc = br#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <title>Post</title>
    <link href="http://b.com/canonical"/>
    <link href="http://b.com/comments" rel="replies"/>
  </entry>
</feed>"#;
    let entries = parse_feed(doc).expect("parse ok");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].link, "http://b.com/canonical");
}

#[test]
fn feed_with_no_items_or_entries_is_empty() {
    let doc = br#"<rss><channel><title>Empty</title></channel></rss>"#;
    let entries = parse_feed(doc).expect("parse ok");
    assert!(entries.is_empty());
}

#[test]
fn malformed_xml_is_a_feed_error() {
    assert!(parse_feed(b"<rss><channel><item></rss>").is_err());
}

#[test]
fn titles_are_stripped_of_stray_markup() {
    assert_eq!(
        clean_title("A <strong>big</strong>&nbsp;deal"),
        "A big deal"
    );
}
