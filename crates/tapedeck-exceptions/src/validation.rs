use std::fmt;

use serde_json::error::Category;
use tapedeck_core::ValidationIssue;

/// A request that did not match its schema
///
/// Holds one issue per failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub const fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Single-issue error
    pub fn issue<I, S>(loc: I, msg: impl Into<String>, r#type: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(vec![ValidationIssue {
            loc: loc.into_iter().map(Into::into).collect(),
            msg: msg.into(),
            r#type: r#type.into(),
        }])
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.issues.len();
        write!(f, "{count} validation error{}", if count == 1 { "" } else { "s" })?;
        for issue in &self.issues {
            write!(f, "\n{}\n  {} [type={}]", issue.loc.join("."), issue.msg, issue.r#type)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        let kind = match err.classify() {
            Category::Syntax | Category::Eof => "json_invalid",
            Category::Data => "value_error",
            Category::Io => "unknown",
        };
        Self::issue(["body"], err.to_string(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_is_reported_against_the_body() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let validation = ValidationError::from(err);

        assert_eq!(validation.issues().len(), 1);
        assert_eq!(validation.issues()[0].loc, ["body"]);
        assert_eq!(validation.issues()[0].r#type, "json_invalid");
    }

    #[test]
    fn display_lists_every_issue() {
        let err = ValidationError::new(vec![
            ValidationIssue {
                loc: vec!["body".into(), "model".into()],
                msg: "Field required".into(),
                r#type: "missing".into(),
            },
            ValidationIssue {
                loc: vec!["body".into(), "temperature".into()],
                msg: "Input should be a valid number".into(),
                r#type: "float_parsing".into(),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "2 validation errors\nbody.model\n  Field required [type=missing]\nbody.temperature\n  Input should be a valid number [type=float_parsing]"
        );
    }
}
