//! Configuration access port trait.

/// Raw `[section] key` lookup. Typing and validation happen in
/// `PipelineConfig::from_port`, so implementations only hand back text.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
