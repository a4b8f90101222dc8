use serde::{Deserialize, Serialize};

/// Tunables of a simulator instance.
///
/// Every field has a default, so a configuration file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Initial stack pointer; the stack and heap block ends here.
    pub stack_top: u64,

    /// Heap size used when the image does not say where its heap starts.
    pub default_heap_size: u64,

    /// Instructions executed by one `run` call before it gives control back.
    pub max_instructions: Option<u64>,

    /// Emit a trace event for every executed instruction.
    pub trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            stack_top: 0x0800_0000,
            default_heap_size: 0x0010_0000,
            max_instructions: None,
            trace: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = SimConfig::default();
        assert_eq!(config.stack_top, 0x0800_0000);
        assert_eq!(config.default_heap_size, 1 << 20);
        assert_eq!(config.max_instructions, None);
        assert!(!config.trace);
    }
}
