// Complaint pipeline prompt templates.
// All prompts for the complaints module are defined here.

pub const CLASSIFY_PROMPT: &str = r#"You are a civic complaint analysis AI. Analyze this complaint and return ONLY valid JSON.

Complaint Title: {title}
Complaint Description: {description}

Return exactly this JSON structure (no markdown, no explanation):
{
  "category": "<one of: Road & Infrastructure, Water Supply, Sanitation, Electricity, Public Safety, Parks & Green Spaces, Noise Pollution, Other>",
  "severity": "<one of: Low, Medium, High>",
  "summary": "<1-2 sentence summary of the core issue>",
  "keywords": ["<keyword1>", "<keyword2>", "<keyword3>"]
}

Severity guide:
- High: immediate safety risk, water/power outage, major road damage
- Medium: recurring issue, moderate inconvenience, health risk
- Low: minor issue, aesthetic problem, low urgency
"#;
