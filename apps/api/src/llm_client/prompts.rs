// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps generated copy anchored to the supplied listing.
pub const FIDELITY_INSTRUCTION: &str = "\
    CRITICAL: Use only facts present in the listing you are given. \
    Do NOT invent salary figures, benefits, team sizes, tools or requirements. \
    If a detail is not stated, describe it in general terms or omit it.";
