/// Resource limits applied while compiling and running rules
///
/// Rule text is user authored, so the engine bounds how much work a single
/// rule can request. The defaults are far above what fee rules need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum size of one rule's text in bytes
    pub max_rule_bytes: usize,

    /// Maximum expression nesting depth
    pub max_expression_depth: usize,

    /// Maximum number of expression strings a rule may fan out into
    pub max_fanout_expressions: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_rule_bytes: 64 * 1024, // 64 KB
            max_expression_depth: 100,
            max_fanout_expressions: 1000,
        }
    }
}

impl ResourceLimits {
    pub fn new() -> Self {
        Self::default()
    }
}
