//! Engine limits loaded from the environment.

/// Default cap on the length (bytes) of a single expression.
pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 4096;

/// Default cap on nested sub-expression evaluation.
///
/// Logical operands nest at most two levels (an `&&` operand holding `||`),
/// so only a cap below 2 rejects anything; `1` forbids mixing `&&` and `||`.
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 32;

/// Bounds applied by the interpreter to every evaluation.
///
/// Expressions are assumed cheap; these limits keep a pathological stored
/// expression from dominating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_expression_length: usize,
    pub max_expression_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `CBAP_MAX_EXPRESSION_LENGTH` | `4096`  |
    /// | `CBAP_MAX_EXPRESSION_DEPTH`  | `32`    |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            max_expression_length: read_limit(
                &lookup,
                "CBAP_MAX_EXPRESSION_LENGTH",
                DEFAULT_MAX_EXPRESSION_LENGTH,
            ),
            max_expression_depth: read_limit(
                &lookup,
                "CBAP_MAX_EXPRESSION_DEPTH",
                DEFAULT_MAX_EXPRESSION_DEPTH,
            ),
        }
    }
}

fn read_limit(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                tracing::warn!(key, value = %raw, default, "Ignoring invalid engine limit");
                default
            }
        },
    }
}
