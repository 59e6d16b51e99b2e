//! Repeating record pattern detection
//!
//! Finds the group of sibling elements most likely to represent repeated
//! records on a page: search-result cards, directory rows, list items.

use std::collections::HashMap;

use scraper::ElementRef;
use tracing::debug;

/// Sibling groups need at least this many members to count as repeating.
const MIN_GROUP_SIZE: usize = 3;

struct Candidate<'a> {
    members: Vec<ElementRef<'a>>,
    /// Traversal sequence of the recording; size ties go to the latest.
    seq: usize,
}

/// Scan `root`'s subtree for the largest group of sibling elements that
/// share a tag + class fingerprint. Returns the winning group's members
/// in document order, or empty when no group reaches three members.
///
/// A fingerprint seen again deeper in the tree only replaces its earlier
/// recording when the new group is strictly larger; groups of equal size
/// with different fingerprints resolve to whichever was recorded last.
pub fn detect_records(root: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut candidates: HashMap<String, Candidate> = HashMap::new();
    let mut seq = 0;
    walk(root, &mut candidates, &mut seq);

    match candidates.into_values().max_by_key(|c| (c.members.len(), c.seq)) {
        Some(best) => {
            debug!(records = best.members.len(), "repeating pattern detected");
            best.members
        }
        None => Vec::new(),
    }
}

fn walk<'a>(node: ElementRef<'a>, candidates: &mut HashMap<String, Candidate<'a>>, seq: &mut usize) {
    let children: Vec<ElementRef<'a>> = node.children().filter_map(ElementRef::wrap).collect();
    if children.len() < 2 {
        for child in children {
            walk(child, candidates, seq);
        }
        return;
    }

    // Group the children by fingerprint, in first-occurrence order
    let mut groups: Vec<(String, Vec<ElementRef<'a>>)> = Vec::new();
    for child in children {
        let key = fingerprint(child);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(child),
            None => groups.push((key, vec![child])),
        }
    }

    for (key, members) in groups {
        if members.len() >= MIN_GROUP_SIZE {
            *seq += 1;
            let larger = candidates
                .get(&key)
                .map_or(true, |existing| members.len() > existing.members.len());
            if larger {
                candidates.insert(
                    key,
                    Candidate {
                        members: members.clone(),
                        seq: *seq,
                    },
                );
            }
        }
        for member in members {
            walk(member, candidates, seq);
        }
    }
}

fn fingerprint(el: ElementRef<'_>) -> String {
    let e = el.value();
    let mut classes: Vec<&str> = e.classes().collect();
    classes.sort_unstable();
    format!("{}|{}", e.name(), classes.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn body(doc: &Html) -> ElementRef<'_> {
        doc.select(&Selector::parse("body").unwrap()).next().unwrap()
    }

    fn texts(records: &[ElementRef]) -> Vec<String> {
        records
            .iter()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect()
    }

    #[test]
    fn test_finds_repeated_siblings_in_document_order() {
        let doc = Html::parse_document(
            r#"<body>
                <h1>Results</h1>
                <ul>
                    <li class="item">one</li>
                    <li class="item">two</li>
                    <li class="item">three</li>
                    <li class="ad">sponsored</li>
                    <p>footer</p>
                </ul>
            </body>"#,
        );

        let records = detect_records(body(&doc));
        assert_eq!(texts(&records), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_two_members_is_not_a_pattern() {
        let doc = Html::parse_document(
            r#"<body><div class="x">a</div><div class="x">b</div></body>"#,
        );

        assert!(detect_records(body(&doc)).is_empty());
    }

    #[test]
    fn test_largest_group_wins() {
        let doc = Html::parse_document(
            r#"<body>
                <nav><a class="tab">t1</a><a class="tab">t2</a><a class="tab">t3</a></nav>
                <main>
                    <div class="card">c1</div>
                    <div class="card">c2</div>
                    <div class="card">c3</div>
                    <div class="card">c4</div>
                </main>
            </body>"#,
        );

        let records = detect_records(body(&doc));
        assert_eq!(texts(&records), vec!["c1", "c2", "c3", "c4"]);
    }

    #[test]
    fn test_class_order_does_not_split_a_group() {
        let doc = Html::parse_document(
            r#"<body><section>
                <div class="row odd">1</div>
                <div class="odd row">2</div>
                <div class="row odd">3</div>
            </section></body>"#,
        );

        let records = detect_records(body(&doc));
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_nested_patterns_are_still_found() {
        // the repeated group sits two levels below the root
        let doc = Html::parse_document(
            r#"<body><div id="app"><div class="list">
                <span class="cell">a</span>
                <span class="cell">b</span>
                <span class="cell">c</span>
            </div></div></body>"#,
        );

        let records = detect_records(body(&doc));
        assert_eq!(texts(&records), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_size_tie_goes_to_the_later_group() {
        let doc = Html::parse_document(
            r#"<body>
                <div><p class="x">p1</p><p class="x">p2</p><p class="x">p3</p></div>
                <div><span class="y">s1</span><span class="y">s2</span><span class="y">s3</span></div>
            </body>"#,
        );

        let records = detect_records(body(&doc));
        assert_eq!(texts(&records), vec!["s1", "s2", "s3"]);
    }
}
