use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use titler_core::TITLE_PLACEHOLDER;

/// Title of the first `<entry>` in an Atom feed, or the placeholder.
///
/// Only direct children are considered: the root's first `entry`, then that
/// entry's first `title`. The title's leading text run is returned verbatim.
/// A missing entry, a missing or empty title, or malformed XML all yield
/// [`TITLE_PLACEHOLDER`]; this never fails.
pub fn parse_feed_title(xml: &str) -> String {
    match first_entry_title(xml) {
        Ok(Some(title)) => title,
        Ok(None) => {
            debug!("feed has no entry title");
            TITLE_PLACEHOLDER.to_string()
        }
        Err(e) => {
            warn!(error = %e, "unable to determine title of paper");
            TITLE_PLACEHOLDER.to_string()
        }
    }
}

/// Progress through the feed towards the first entry's title.
enum Scan {
    SeekEntry,
    InEntry,
    InTitle(String),
    Done(Option<String>),
}

fn non_empty(text: String) -> Option<String> {
    Some(text).filter(|t| !t.is_empty())
}

fn is_named(e: &BytesStart<'_>, name: &[u8]) -> bool {
    e.local_name().as_ref().eq_ignore_ascii_case(name)
}

/// The whole document is read even after the title is found, so a feed that
/// breaks later on still counts as malformed.
fn first_entry_title(xml: &str) -> Result<Option<String>, String> {
    let mut reader = Reader::from_str(xml);

    // Depth of the innermost open element; the feed root sits at 1.
    let mut depth = 0usize;
    let mut scan = Scan::SeekEntry;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                depth += 1;
                scan = match scan {
                    Scan::SeekEntry if depth == 2 && is_named(&e, b"entry") => Scan::InEntry,
                    Scan::InEntry if depth == 3 && is_named(&e, b"title") => {
                        Scan::InTitle(String::new())
                    }
                    // A child element ends the title's first text run.
                    Scan::InTitle(text) => Scan::Done(non_empty(text)),
                    other => other,
                };
            }
            Event::Empty(e) => {
                // `<entry/>` or `<title/>`: the element exists but has no text.
                scan = match scan {
                    Scan::SeekEntry if depth == 1 && is_named(&e, b"entry") => Scan::Done(None),
                    Scan::InEntry if depth == 2 && is_named(&e, b"title") => Scan::Done(None),
                    Scan::InTitle(text) => Scan::Done(non_empty(text)),
                    other => other,
                };
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Scan::InTitle(buf) = &mut scan {
                    buf.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Scan::InTitle(buf) = &mut scan {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Comment(_) | Event::PI(_) => {
                if let Scan::InTitle(text) = scan {
                    scan = Scan::Done(non_empty(text));
                }
            }
            Event::End(_) => {
                scan = match scan {
                    Scan::InTitle(text) => Scan::Done(non_empty(text)),
                    Scan::InEntry if depth == 2 => Scan::Done(None),
                    other => other,
                };
                depth = depth.saturating_sub(1);
            }
            Event::Eof => {
                if depth > 0 {
                    return Err(format!("document ended with {depth} unclosed element(s)"));
                }
                return Ok(match scan {
                    Scan::Done(title) => title,
                    _ => None,
                });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTENTION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/"
      xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=&amp;id_list=1706.03762</title>
  <id>http://arxiv.org/api/query?id_list=1706.03762</id>
  <opensearch:totalResults>1</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T17:54:37Z</updated>
    <published>2017-06-12T17:57:40Z</published>
    <title>Attention Is All You Need</title>
    <summary>The dominant sequence transduction models are based on recurrent networks.</summary>
    <author><name>Ashish Vaswani</name></author>
    <link title="pdf" rel="related" type="application/pdf" href="http://arxiv.org/pdf/1706.03762v7" />
  </entry>
  <entry>
    <title>Second Entry</title>
  </entry>
</feed>
"#;

    #[test]
    fn parses_first_entry_title() {
        assert_eq!(parse_feed_title(ATTENTION_XML), "Attention Is All You Need");
    }

    #[test]
    fn no_entry_gives_placeholder() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>ArXiv Query</title></feed>"#;
        assert_eq!(parse_feed_title(xml), TITLE_PLACEHOLDER);
    }

    #[test]
    fn entry_without_title_gives_placeholder() {
        let xml = r#"<feed><entry><id>x</id><summary>abstract</summary></entry><entry><title>Later</title></entry></feed>"#;
        assert_eq!(parse_feed_title(xml), TITLE_PLACEHOLDER);
    }

    #[test]
    fn empty_title_gives_placeholder() {
        assert_eq!(parse_feed_title("<feed><entry><title/></entry></feed>"), TITLE_PLACEHOLDER);
        assert_eq!(
            parse_feed_title("<feed><entry><title></title></entry></feed>"),
            TITLE_PLACEHOLDER
        );
    }

    #[test]
    fn malformed_xml_gives_placeholder() {
        assert_eq!(parse_feed_title("<feed><entry><title>Oops</entry>"), TITLE_PLACEHOLDER);
        assert_eq!(parse_feed_title("not xml at all"), TITLE_PLACEHOLDER);
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        let xml = "<FEED><Entry><TITLE>Shouting Nets</TITLE></Entry></FEED>";
        assert_eq!(parse_feed_title(xml), "Shouting Nets");
    }

    #[test]
    fn title_text_is_verbatim_and_unescaped() {
        let xml = "<feed><entry><title>Graphs &amp; Nets:\n  A Survey</title></entry></feed>";
        assert_eq!(parse_feed_title(xml), "Graphs & Nets:\n  A Survey");
    }

    #[test]
    fn stops_at_first_child_element() {
        let xml = "<feed><entry><title>Lead <i>italic</i> tail</title></entry></feed>";
        assert_eq!(parse_feed_title(xml), "Lead ");
    }

    #[test]
    fn nested_titles_are_not_direct_children() {
        let xml = "<feed><entry><author><title>Dr</title></author><title>Real</title></entry></feed>";
        assert_eq!(parse_feed_title(xml), "Real");
    }

    #[test]
    fn truncated_feed_gives_placeholder() {
        let xml = "<feed><entry><title>Half Sent</title><summary>cut";
        assert_eq!(parse_feed_title(xml), TITLE_PLACEHOLDER);
    }

    #[test]
    fn bad_entity_after_title_gives_placeholder() {
        let xml = "<feed><entry><title>X</title><summary>a &bogus; b</summary></entry></feed>";
        assert_eq!(parse_feed_title(xml), TITLE_PLACEHOLDER);
    }

    #[test]
    fn comment_ends_text_run() {
        let xml = "<feed><entry><title>A<!-- c -->B</title></entry></feed>";
        assert_eq!(parse_feed_title(xml), "A");
    }
}
