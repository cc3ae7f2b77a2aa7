//! Per-call mutable state.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::options::SanitizeOptions;
use crate::tags;

static DEFAULT_ALLOW_LIST: LazyLock<HashSet<String>> = LazyLock::new(tags::default_allow_list);

/// State for one sanitize call; created at the start and dropped at the end.
pub struct ParseContext<'a> {
    /// Identity handed out by the next `allocate_key`
    next_key: u32,
    pub options: &'a SanitizeOptions,
    allowed: &'a HashSet<String>,
}

impl<'a> ParseContext<'a> {
    pub fn new(options: &'a SanitizeOptions) -> Self {
        Self {
            next_key: 0,
            options,
            allowed: options.allow_list.as_ref().unwrap_or(&*DEFAULT_ALLOW_LIST),
        }
    }

    /// Hand out the next identity.
    pub fn allocate_key(&mut self) -> u32 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    /// Snapshot the counter, to undo allocations with [`Self::rollback`].
    pub fn checkpoint(&self) -> u32 {
        self.next_key
    }

    pub fn rollback(&mut self, checkpoint: u32) {
        debug_assert!(checkpoint <= self.next_key);
        self.next_key = checkpoint;
    }

    /// Blacklisted or caller-blocked.
    pub fn is_tag_blocked(&self, tag: &str) -> bool {
        tags::is_blacklisted(tag) || self.options.block_list.contains(tag)
    }

    pub fn is_tag_allowed(&self, tag: &str) -> bool {
        if self.is_tag_blocked(tag) {
            return false;
        }
        self.options.disable_whitelist || self.allowed.contains(tag)
    }

    pub fn is_matcher_disabled(&self, inverse_flag: &str) -> bool {
        self.options.disabled_matchers.contains(inverse_flag)
    }
}
