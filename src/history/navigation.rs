use super::record::HistoryRecord;
use super::snapshot::FrameTreeSnapshot;
use crate::frame::handle::HistoryLoadType;
use url::Url;

/// One frame load issued while traversing between two history positions.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalRequest {
    pub unique_name: String,
    pub record: HistoryRecord,
    pub load_type: HistoryLoadType,
}

/// Decides whether moving a frame from `current` to `other` stays within
/// the same document.
pub fn should_do_same_document_navigation(current: &HistoryRecord, other: &HistoryRecord) -> bool {
    if std::ptr::eq(current, other) {
        return false;
    }

    if current.has_state_object() || other.has_state_object() {
        return current.document_sequence_number == other.document_sequence_number;
    }

    if (has_fragment(&current.url) || has_fragment(&other.url))
        && equal_ignoring_fragment(&current.url, &other.url)
    {
        return current.document_sequence_number == other.document_sequence_number;
    }

    false
}

/// Frame loads needed to move from `current` to `target`, in `target`'s entry order.
///
/// Only frames present in both snapshots with a different item are loaded.
pub fn plan_traversal(current: &FrameTreeSnapshot, target: &FrameTreeSnapshot) -> Vec<TraversalRequest> {
    target
        .entries()
        .iter()
        .filter_map(|wanted| {
            let existing = current.entry(&wanted.unique_name)?;
            if existing.item_sequence_number() == wanted.item_sequence_number() {
                return None;
            }

            let load_type = if should_do_same_document_navigation(&existing.record, &wanted.record) {
                HistoryLoadType::SameDocument
            } else {
                HistoryLoadType::DifferentDocument
            };
            Some(TraversalRequest {
                unique_name: wanted.unique_name.clone(),
                record: wanted.record.clone(),
                load_type,
            })
        })
        .collect()
}

fn has_fragment(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.fragment().is_some(),
        Err(_) => url.contains('#'),
    }
}

fn equal_ignoring_fragment(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(mut a), Ok(mut b)) => {
            a.set_fragment(None);
            b.set_fragment(None);
            a == b
        }
        // Relative or malformed URLs compare textually.
        _ => strip_fragment(a) == strip_fragment(b),
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}
