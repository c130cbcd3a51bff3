// Analytics LLM prompt templates.

pub const LOCALITY_SUMMARY_PROMPT: &str = r#"You are a civic intelligence analyst. Based on these reported civic complaints, generate an insightful locality report.

Recent Complaints:
{complaints}

Return ONLY valid JSON (no markdown):
{
  "summary": "<2-3 paragraph analysis of the main civic problems>",
  "top_issues": ["<issue 1>", "<issue 2>", "<issue 3>"],
  "recommendations": ["<recommendation 1>", "<recommendation 2>", "<recommendation 3>"]
}
"#;
