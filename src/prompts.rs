//! Prompt templates sent to the text-generation service.
//!
//! Each template has exactly one `{logs}` placeholder that receives the
//! rendered sample table.

pub const LOGS_PLACEHOLDER: &str = "{logs}";

/// Asks for one `TYPE | PRIORITY | SUMMARY | SUGGESTION` line per issue.
pub const EXTRACTION_TEMPLATE: &str = r"You are a log analysis engine. Your task is to analyze log data.
You MUST NOT greet or ask questions.
You MUST ONLY output the analysis in the specified format.

Analyze the log data below. Find all 'ERROR', 'SECURITY', and 'WARN' logs.
Create one line for each unique issue.

Your response MUST follow this exact format:
TYPE | PRIORITY | SUMMARY | SUGGESTION

- TYPE must be 'Error' or 'Warning'.
- PRIORITY must be High, Medium, or Low.
- SUMMARY is a 1-sentence summary.
- SUGGESTION is the likely cause.

Label 'ERROR' and 'SECURITY' logs as 'Error' (High/Medium priority).
Label 'WARN' logs as 'Warning' (Low priority).

Example Output:
Error | High | PaymentAPI is down | BankConnector service is not responding.
Warning | Low | Database connection pool at 80% | The DB is under heavy load.
Error | Medium | Suspicious login attempts | Potential brute-force attack.

--- LOG DATA BEGINS ---
{logs}
--- LOG DATA ENDS ---
";

/// Asks for a single 1-2 sentence observation about the dominant pattern.
pub const INSIGHT_TEMPLATE: &str = r#"You are a senior analyst AI. You will be given a list of log errors and warnings.
Your job is to find the SINGLE MOST IMPORTANT pattern or insight.
Do not list the errors. Just provide a 1-2 sentence summary.

Focus on:
- Time: Is there a spike at a specific time? (Logs have timestamps)
- Service: Is one service (like 'PaymentAPI') failing the most?
- Type: Is there a common error type (like 'timeout')?

Example: "I see a major spike in 'Payment failed: Bank server timeout' errors, all originating from the 'BankConnector' service between 3:00 and 3:10 AM. This suggests a critical outage with that specific partner."

Here are the logs to analyze:
{logs}
"#;

#[must_use]
pub fn render_extraction_prompt(logs: &str) -> String {
    EXTRACTION_TEMPLATE.replacen(LOGS_PLACEHOLDER, logs, 1)
}

#[must_use]
pub fn render_insight_prompt(logs: &str) -> String {
    INSIGHT_TEMPLATE.replacen(LOGS_PLACEHOLDER, logs, 1)
}
