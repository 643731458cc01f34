//! Turns the model's pipe-delimited reply into errors and warnings.
//!
//! Model output drifts: extra whitespace, Markdown table edges, header and
//! divider rows, odd casing. Any line that does not yield a usable issue is
//! dropped; parsing itself never fails.
use tracing::trace;

use crate::model::{Issue, IssueKind, Priority};

const SEPARATOR: char = '|';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedIssues {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    /// Pipe-bearing lines rejected for their shape or TYPE token. Header and
    /// divider rows are not counted.
    pub dropped_lines: usize,
}

impl ParsedIssues {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

enum LineOutcome {
    Issue(Issue),
    Skipped,
    Dropped,
}

/// Parses every line of `reply`, keeping the order in which issues appear.
#[must_use]
pub fn parse_issues(reply: &str) -> ParsedIssues {
    let mut parsed = ParsedIssues::default();

    for line in reply.lines() {
        match parse_line(line) {
            LineOutcome::Issue(issue) => match issue.kind {
                IssueKind::Error => parsed.errors.push(issue),
                IssueKind::Warning => parsed.warnings.push(issue),
            },
            LineOutcome::Skipped => {}
            LineOutcome::Dropped => {
                trace!(line, "dropping malformed reply line");
                parsed.dropped_lines += 1;
            }
        }
    }

    parsed
}

fn parse_line(line: &str) -> LineOutcome {
    if !line.contains(SEPARATOR) {
        return LineOutcome::Skipped;
    }

    let cleaned = line.trim().trim_matches(SEPARATOR);
    let fields: Vec<&str> = cleaned.split(SEPARATOR).map(str::trim).collect();
    let [kind, priority, summary, suggestion] = fields.as_slice() else {
        return LineOutcome::Dropped;
    };

    let kind_token = kind.to_lowercase();
    if is_header_marker(&kind_token) {
        return LineOutcome::Skipped;
    }

    let kind = match kind_token.as_str() {
        "error" => IssueKind::Error,
        "warning" => IssueKind::Warning,
        _ => return LineOutcome::Dropped,
    };

    LineOutcome::Issue(Issue {
        kind,
        priority: Priority::parse(priority),
        summary: (*summary).to_string(),
        suggestion: (*suggestion).to_string(),
    })
}

/// `type` header cells and Markdown divider cells such as `----` or `:---:`.
fn is_header_marker(token: &str) -> bool {
    token == "type" || (token.contains('-') && token.chars().all(|c| c == '-' || c == ':'))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn issue(kind: IssueKind, priority: Priority, summary: &str, suggestion: &str) -> Issue {
        Issue {
            kind,
            priority,
            summary: summary.to_string(),
            suggestion: suggestion.to_string(),
        }
    }

    #[test]
    fn parses_header_and_two_issues() {
        let reply = "TYPE | PRIORITY | SUMMARY | SUGGESTION\n\
                     Error | High | PaymentAPI is down | BankConnector service is not responding.\n\
                     Warning | Low | DB pool at 80% | Heavy load.\n";

        let parsed = parse_issues(reply);

        assert_eq!(
            parsed.errors,
            vec![issue(
                IssueKind::Error,
                Priority::High,
                "PaymentAPI is down",
                "BankConnector service is not responding."
            )]
        );
        assert_eq!(
            parsed.warnings,
            vec![issue(
                IssueKind::Warning,
                Priority::Low,
                "DB pool at 80%",
                "Heavy load."
            )]
        );
        assert_eq!(parsed.dropped_lines, 0);
    }

    #[rstest]
    #[case("Error | High | X | Y")]
    #[case("| Error | High | X | Y |")]
    #[case("  Error|High|X|Y  ")]
    #[case("||Error | High | X | Y||")]
    #[case("\tERROR | High | X | Y")]
    fn tolerates_edge_pipes_whitespace_and_case(#[case] line: &str) {
        let parsed = parse_issues(line);
        assert_eq!(
            parsed.errors,
            vec![issue(IssueKind::Error, Priority::High, "X", "Y")]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[rstest]
    #[case::three_fields("Error | High | X")]
    #[case::five_fields("Error | High | X | Y | Z")]
    #[case::info_type("Info | Low | X | Y")]
    fn drops_and_counts_malformed_lines(#[case] line: &str) {
        let parsed = parse_issues(line);
        assert!(parsed.is_empty());
        assert_eq!(parsed.dropped_lines, 1);
    }

    #[rstest]
    #[case::header("Type | Priority | Summary | Suggestion")]
    #[case::upper_header("TYPE|PRIORITY|SUMMARY|SUGGESTION")]
    #[case::divider("---- | ---- | ---- | ----")]
    #[case::markdown_divider("|:---|:---:|---|---:|")]
    #[case::prose("The logs show a spike in errors.")]
    #[case::blank("")]
    fn skips_headers_dividers_and_prose(#[case] line: &str) {
        let parsed = parse_issues(line);
        assert!(parsed.is_empty());
        assert_eq!(parsed.dropped_lines, 0);
    }

    #[test]
    fn markdown_table_reply_keeps_order() {
        let reply = "Here is the analysis:\n\
                     | TYPE | PRIORITY | SUMMARY | SUGGESTION |\n\
                     |------|----------|---------|------------|\n\
                     | Warning | Low | Slow responses | Load spike |\n\
                     | Error | Medium | Token validation failed | Clock skew |\n\
                     | Error | High | Database connection failed | Pool exhausted |\n\
                     | Notice | Low | ignored | ignored |\n";

        let parsed = parse_issues(reply);

        let summaries: Vec<&str> = parsed.errors.iter().map(|i| i.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Token validation failed", "Database connection failed"]
        );
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.dropped_lines, 1);
    }

    #[test]
    fn unknown_priority_is_kept() {
        let parsed = parse_issues("Error | Critical | Disk full | Rotate logs");
        assert_eq!(parsed.errors[0].priority.as_str(), "Critical");
    }

    #[test]
    fn empty_fields_still_parse() {
        let parsed = parse_issues("Warning |  |  | check disk");
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].summary, "");
    }

    proptest! {
        #[test]
        fn parsing_is_idempotent(reply in "(([A-Za-z ]{0,8}\\|){0,5}[A-Za-z ]{0,8}\n){0,8}") {
            prop_assert_eq!(parse_issues(&reply), parse_issues(&reply));
        }

        #[test]
        fn wrapping_pipes_and_spaces_do_not_change_the_result(
            summary in "[A-Za-z0-9 ]{1,20}",
            suggestion in "[A-Za-z][A-Za-z0-9 .]{0,19}",
            pad in " {0,3}",
        ) {
            let plain = format!("Warning | Medium | {summary} | {suggestion}");
            let wrapped = format!("{pad}|{pad}Warning{pad}|Medium|{summary}|{suggestion}{pad}|{pad}");
            prop_assert_eq!(parse_issues(&plain), parse_issues(&wrapped));
        }
    }
}
