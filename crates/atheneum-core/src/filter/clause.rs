use serde::{Deserialize, Serialize};

/// One leaf comparison from a parsed filter expression
///
/// Tokens are kept raw here: `operator` is one of `= != > >= < <= ~` and
/// `connector` (binding this clause to the previous one) is one of
/// `AND OR && ||`. Parenthesis runs adjacent to the clause are recorded as
/// counts so grouping survives flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    /// Number of opening parentheses directly before the field token
    pub lparens: usize,

    /// Field token, possibly dotted (e.g. `learningObjectives.targetName`)
    pub field: String,

    /// Raw comparison operator token
    pub operator: String,

    /// Unquoted value text; may be empty
    pub value: String,

    /// Raw connector token to the previous clause; `None` on the first
    pub connector: Option<String>,

    /// Number of closing parentheses directly after the value
    pub rparens: usize,
}

impl Clause {
    /// True when the value is the case-insensitive `NULL` sentinel,
    /// meaning "field is absent" rather than a literal match
    pub fn is_null_sentinel(&self) -> bool {
        self.value.eq_ignore_ascii_case("null")
    }

    /// True when the value parsed to nothing at all
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}
