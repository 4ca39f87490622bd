//! Page identities
//!
//! A page is owned by the test runner. Instead of tagging the page object,
//! the caller holds a [`PageHandle`] next to it; the handle carries a lazily
//! minted [`PageId`] that all clones share.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::harness::traits::Page;

/// Opaque, process-unique identity of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(Uuid);

impl PageId {
    fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A page reference plus its identity slot
#[derive(Clone)]
pub struct PageHandle {
    page: Arc<dyn Page>,
    id: Arc<OnceLock<PageId>>,
}

impl PageHandle {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            page,
            id: Arc::new(OnceLock::new()),
        }
    }

    pub fn page(&self) -> &dyn Page {
        self.page.as_ref()
    }

    /// Identity, if one has been assigned yet
    pub fn id(&self) -> Option<PageId> {
        self.id.get().copied()
    }

    /// Identity, minted on first use
    pub fn identity(&self) -> PageId {
        *self.id.get_or_init(PageId::mint)
    }
}

impl fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHandle").field("id", &self.id()).finish()
    }
}
