use std::sync::atomic::{AtomicI64, Ordering};

static SEQUENCE_NUMBER: AtomicI64 = AtomicI64::new(1);

/// Mints a process-wide unique sequence number.
///
/// Item and document sequence numbers share one counter, so a number is
/// never reused for either purpose.
pub fn next_sequence_number() -> i64 {
    SEQUENCE_NUMBER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferrerPolicy {
    NoReferrer,
    NoReferrerWhenDowngrade,
    Origin,
    OriginWhenCrossOrigin,
    SameOrigin,
    StrictOrigin,
    #[default]
    StrictOriginWhenCrossOrigin,
    UnsafeUrl,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Referrer {
    pub url: String,
    pub policy: ReferrerPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollRestoration {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOffset {
    pub x: i64,
    pub y: i64,
}

impl ScrollOffset {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportOffset {
    pub x: f64,
    pub y: f64,
}

/// Snapshot of one frame's navigable state at a single history position.
///
/// Records are plain values: every commit stores its own copy and the
/// controller never hands out shared references to stored records.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub url: String,
    pub referrer: Referrer,
    pub target_frame_name: String,
    /// Serialized script state from `pushState`/`replaceState`. Opaque here.
    pub state_object: Option<String>,
    /// Serialized form control state. Opaque here.
    pub document_state: Vec<String>,
    pub scroll_restoration: ScrollRestoration,
    pub scroll_offset: ScrollOffset,
    pub page_scale_factor: f64,
    /// Identifies one navigation action.
    pub item_sequence_number: i64,
    /// Identifies one loaded document; shared by its same-document navigations.
    pub document_sequence_number: i64,
    pub pinch_viewport_scroll_offset: ViewportOffset,
    pub http_content_type: String,
    pub http_body: Option<Vec<u8>>,
}

impl HistoryRecord {
    /// Creates a record for a new document load, minting fresh item and
    /// document sequence numbers.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referrer: Referrer::default(),
            target_frame_name: String::new(),
            state_object: None,
            document_state: Vec::new(),
            scroll_restoration: ScrollRestoration::Auto,
            scroll_offset: ScrollOffset::default(),
            page_scale_factor: 1.0,
            item_sequence_number: next_sequence_number(),
            document_sequence_number: next_sequence_number(),
            pinch_viewport_scroll_offset: ViewportOffset::default(),
            http_content_type: String::new(),
            http_body: None,
        }
    }

    /// Derives the record for a navigation within the same document
    /// (fragment change or `pushState`): new item number, same document number.
    pub fn same_document(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referrer: Referrer {
                url: self.url.clone(),
                policy: self.referrer.policy,
            },
            state_object: None,
            scroll_offset: ScrollOffset::default(),
            item_sequence_number: next_sequence_number(),
            ..self.clone()
        }
    }

    pub fn with_state_object(mut self, state: impl Into<String>) -> Self {
        self.state_object = Some(state.into());
        self
    }

    pub fn with_referrer(mut self, url: impl Into<String>, policy: ReferrerPolicy) -> Self {
        self.referrer = Referrer {
            url: url.into(),
            policy,
        };
        self
    }

    pub fn with_sequence_numbers(mut self, item: i64, document: i64) -> Self {
        self.item_sequence_number = item;
        self.document_sequence_number = document;
        self
    }

    pub fn has_state_object(&self) -> bool {
        self.state_object.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_records_get_distinct_sequence_numbers() {
        let a = HistoryRecord::new("https://example.com/");
        let b = HistoryRecord::new("https://example.com/");

        assert_ne!(a.item_sequence_number, b.item_sequence_number);
        assert_ne!(a.document_sequence_number, b.document_sequence_number);
        assert_ne!(a.item_sequence_number, a.document_sequence_number);
    }

    #[test]
    fn test_same_document_keeps_document_number() {
        let page = HistoryRecord::new("https://example.com/page");
        let fragment = page.same_document("https://example.com/page#top");

        assert_eq!(fragment.document_sequence_number, page.document_sequence_number);
        assert_ne!(fragment.item_sequence_number, page.item_sequence_number);
        assert_eq!(fragment.referrer.url, "https://example.com/page");
    }

    #[test]
    fn test_same_document_resets_scroll_and_keeps_referrer_policy() {
        let mut page = HistoryRecord::new("https://example.com/page")
            .with_referrer("https://origin.test/", ReferrerPolicy::NoReferrerWhenDowngrade);
        page.scroll_offset = ScrollOffset::new(0, 640);
        page.page_scale_factor = 2.0;

        let fragment = page.same_document("https://example.com/page#end");

        assert_eq!(page.referrer.url, "https://origin.test/");
        assert_eq!(
            fragment.referrer,
            Referrer {
                url: "https://example.com/page".to_string(),
                policy: ReferrerPolicy::NoReferrerWhenDowngrade,
            }
        );
        assert_eq!(fragment.scroll_offset, ScrollOffset::default());
        assert_eq!(fragment.page_scale_factor, 2.0);
    }

    #[test]
    fn test_empty_state_object_is_not_state() {
        let record = HistoryRecord::new("https://example.com/");
        assert!(!record.has_state_object());
        assert!(!record.clone().with_state_object("").has_state_object());
        assert!(record.with_state_object("{\"n\":1}").has_state_object());
    }
}
