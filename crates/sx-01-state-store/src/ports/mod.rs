//! Read-only view of a store, handed to downstream extractors and builders.

/// Read access to a store's current state.
///
/// Within one block, a downstream reader observes every mutation its upstream
/// builder has already made for that block.
pub trait StoreReader {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<&[u8]>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Value at `key` as UTF-8 text.
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Entries whose key starts with `prefix`, in key order.
    fn scan_prefix<'a>(&'a self, prefix: &'a str) -> Box<dyn Iterator<Item = (&'a str, &'a [u8])> + 'a>;
}
