pub const EXPAND_DESCRIPTION_SYSTEM: &str = "You are an editor for a creator and AI-talent job board. \
    You turn terse job listings into complete, readable job descriptions.";

pub const EXPAND_DESCRIPTION_PROMPT_TEMPLATE: &str = r#"Rewrite the job listing below as a full job description of roughly 350-500 words.

Structure it as: a short overview paragraph, "Responsibilities" (bulleted), "What we're looking for" (bulleted), and a closing paragraph on how the role is set up ({job_type}, {location}).

{fidelity_instruction}

Job title: {title}
Company: {company}
Location: {location}
Job type: {job_type}

Original listing:
{description}

Return JSON with exactly this shape:
{"expanded_description": "<the full description as plain text, bullets as lines starting with '- '>"}
"#;
