use std::fmt;

/// The single verdict string recognized as success. Compared exactly,
/// case-sensitive.
pub const PASSED: &str = "Passed";

/// A terminal verdict read from a coordination record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    /// Any other value, carried verbatim.
    NotPassed(String),
}

impl Verdict {
    pub fn from_result(result: impl Into<String>) -> Self {
        let result = result.into();
        if result == PASSED {
            Verdict::Passed
        } else {
            Verdict::NotPassed(result)
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    /// The verdict string exactly as the external actor wrote it.
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Passed => PASSED,
            Verdict::NotPassed(result) => result,
        }
    }

    /// Human-readable failure message embedding the literal verdict, or
    /// `None` for a pass.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Verdict::Passed => None,
            Verdict::NotPassed(result) => Some(format!("Result is not Passed: {}", result)),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passed_is_success() {
        let v = Verdict::from_result("Passed");
        assert!(v.is_passed());
        assert_eq!(v.failure_message(), None);
        assert_eq!(v.to_string(), "Passed");
    }

    #[test]
    fn match_is_case_sensitive() {
        for s in ["passed", "PASSED", " Passed", "Passed "] {
            let v = Verdict::from_result(s);
            assert!(!v.is_passed(), "{s:?} must not count as a pass");
        }
    }

    #[test]
    fn other_verdicts_are_passed_through_verbatim() {
        let v = Verdict::from_result("Failed: error rate 4.2%");
        assert_eq!(v.as_str(), "Failed: error rate 4.2%");
        assert_eq!(
            v.failure_message().as_deref(),
            Some("Result is not Passed: Failed: error rate 4.2%")
        );
    }

    #[test]
    fn empty_verdict_is_not_a_pass() {
        let v = Verdict::from_result("");
        assert_eq!(v, Verdict::NotPassed(String::new()));
        assert_eq!(v.failure_message().as_deref(), Some("Result is not Passed: "));
    }
}
