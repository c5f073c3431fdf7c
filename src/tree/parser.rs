//! Structural parser for taxonomy tree pages
//!
//! A tree page nests taxa inside `div` containers of five classes:
//!
//! - `treediv` / `treeenddiv` — one taxon line, possibly with its own
//!   children nested inside
//! - `treecontdiv` — a continuation marker ("...") that detaches the
//!   following siblings from their apparent parent
//! - `treebodydiv` / `treebodyenddiv` — a wrapper whose contents belong to
//!   the same parent as the wrapper itself
//!
//! The parser walks these containers depth-first with an explicit stack,
//! yielding `(id, Taxon)` pairs children-before-parent. A taxon below the
//! species threshold whose descent yields nothing is flagged `to_visit`:
//! its children exist but are not visible on this page.

use crate::rank::{self, RankTable};
use crate::tree::{Taxon, TaxonId};
use crate::CrawlError;
use scraper::ElementRef;

/// Structural role of a tree container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Plain,
    Continuation,
    Body,
}

fn classify(el: &ElementRef) -> Option<NodeKind> {
    let mut kind = None;
    for class in el.value().classes() {
        match class {
            "treecontdiv" => return Some(NodeKind::Continuation),
            "treebodydiv" | "treebodyenddiv" => kind = Some(NodeKind::Body),
            "treediv" | "treeenddiv" => kind = kind.or(Some(NodeKind::Plain)),
            _ => {}
        }
    }
    kind
}

/// Direct tree containers of an element, in document order
fn tree_children(el: ElementRef<'_>) -> Vec<(NodeKind, ElementRef<'_>)> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter_map(|child| classify(&child).map(|kind| (kind, child)))
        .collect()
}

/// One traversal frame: the containers still to process at this depth
struct Frame<'a> {
    children: std::vec::IntoIter<(NodeKind, ElementRef<'a>)>,
    parent: Option<TaxonId>,
    /// Taxon emitted when this frame is exhausted (plain nodes below the
    /// species threshold descend into their own children first)
    pending: Option<(TaxonId, Taxon)>,
    /// Records yielded while this frame was on the stack
    yielded: usize,
}

impl<'a> Frame<'a> {
    fn over(el: ElementRef<'a>, parent: Option<TaxonId>) -> Self {
        Self {
            children: tree_children(el).into_iter(),
            parent,
            pending: None,
            yielded: 0,
        }
    }

    fn with_pending(el: ElementRef<'a>, id: TaxonId, taxon: Taxon) -> Self {
        Self {
            children: tree_children(el).into_iter(),
            parent: Some(id),
            pending: Some((id, taxon)),
            yielded: 0,
        }
    }
}

/// Lazy traversal over one page region
///
/// Restartable per call; holds no state beyond the current traversal.
pub struct TaxonIter<'a> {
    ranks: &'a RankTable,
    stack: Vec<Frame<'a>>,
}

/// Parses the taxa visible in `region`, rooted at `parent`
pub fn taxons<'a>(
    region: ElementRef<'a>,
    parent: Option<TaxonId>,
    ranks: &'a RankTable,
) -> TaxonIter<'a> {
    TaxonIter {
        ranks,
        stack: vec![Frame::over(region, parent)],
    }
}

impl<'a> Iterator for TaxonIter<'a> {
    type Item = crate::Result<(TaxonId, Taxon)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return None;
            };
            let Some((kind, el)) = frame.children.next() else {
                let finished = self.stack.pop();
                if let Some(Frame {
                    pending: Some((id, mut taxon)),
                    yielded,
                    ..
                }) = finished
                {
                    // Children were visible inline iff the descent yielded
                    taxon.to_visit = yielded == 0;
                    return Some(Ok(self.emit(id, taxon)));
                }
                continue;
            };
            let parent = frame.parent;
            match kind {
                NodeKind::Continuation => {
                    // "..." line: the following siblings belong to a parent
                    // not shown on this page
                    frame.parent = None;
                }
                NodeKind::Body => {
                    self.stack.push(Frame::over(el, parent));
                }
                NodeKind::Plain => {
                    let (id, taxon) = match extract_taxon(el, parent, self.ranks) {
                        Ok(pair) => pair,
                        Err(e) => return Some(Err(e)),
                    };
                    if rank::can_expand(taxon.level) {
                        self.stack.push(Frame::with_pending(el, id, taxon));
                    } else {
                        return Some(Ok(self.emit(id, taxon)));
                    }
                }
            }
        }
    }
}

impl<'a> TaxonIter<'a> {
    /// Marks one record as yielded for every enclosing frame
    fn emit(&mut self, id: TaxonId, taxon: Taxon) -> (TaxonId, Taxon) {
        for frame in &mut self.stack {
            frame.yielded += 1;
        }
        (id, taxon)
    }
}

/// Extracts one taxon from a plain node's inline content
///
/// The taxon line sits before any nested tree container: an optional rank
/// label as bare text, the taxon anchor carrying id and primary name, and
/// an optional `<b>` vernacular name. A plain node without a taxon anchor
/// means the page layout changed; that is fatal, not skippable.
fn extract_taxon(
    el: ElementRef<'_>,
    parent: Option<TaxonId>,
    ranks: &RankTable,
) -> crate::Result<(TaxonId, Taxon)> {
    let mut label = String::new();
    let mut anchor = None;
    let mut secondary = None;

    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if classify(&child_el).is_some() {
                // Nested subtree starts here; the taxon line is over
                break;
            }
            match child_el.value().name() {
                "a" if anchor.is_none() => {
                    let id = child_el.value().attr("href").and_then(crate::url::taxon_id);
                    if let Some(id) = id {
                        anchor = Some((id, child_el));
                    }
                }
                "b" if anchor.is_some() && secondary.is_none() => {
                    let text = child_el.text().collect::<String>().trim().to_string();
                    if !text.is_empty() {
                        secondary = Some(text);
                    }
                }
                _ => {}
            }
        } else if let Some(text) = child.value().as_text() {
            if anchor.is_none() {
                label.push_str(text);
            }
        }
    }

    let Some((id, anchor)) = anchor else {
        return Err(malformed(el));
    };
    let name = anchor.text().collect::<String>().trim().to_string();
    if name.is_empty() {
        return Err(malformed(el));
    }

    let label = label.trim();
    let level = ranks.level_of((!label.is_empty()).then_some(label));

    let taxon = Taxon {
        level,
        name,
        name_cs: secondary,
        parent,
        to_visit: false,
    };
    Ok((id, taxon))
}

fn malformed(el: ElementRef<'_>) -> CrawlError {
    let snippet: String = el.html().chars().take(50).collect();
    CrawlError::MalformedNode { snippet }
}
