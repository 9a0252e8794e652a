//! Configuration access port.

/// Read-only view of a sectioned key/value configuration.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Names of every section present, lower-cased.
    fn sections(&self) -> Vec<String>;
}
