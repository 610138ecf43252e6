//! Prompt and response-schema builders for the analysis calls.

use serde_json::{json, Value};

use broll_models::TEMPLATE_JSON;

/// The visual template, minified for embedding into instruction prompts.
pub fn minified_template() -> String {
    serde_json::from_str::<Value>(TEMPLATE_JSON)
        .and_then(|v| serde_json::to_string(&v))
        .unwrap_or_else(|_| TEMPLATE_JSON.to_string())
}

/// Build the instruction prompt for script analysis.
pub fn script_analysis_prompt(script: &str) -> String {
    format!(
        r#"You are a professional video editor and B-roll director.
Analyze the following video script, which may be up to 10 minutes long.

Your specific task is to provide a granular, line-by-line breakdown of visual scenes.

Guidelines:
1. STRICT LINE-BY-LINE ANALYSIS: Do not group large paragraphs. Create a new visual scene for almost every sentence or distinct clause to ensure there is enough B-roll for the entire duration.
2. For a 10-minute script, generate as many scenes as necessary to cover the audio continuously (this could be 50-100+ scenes).
3. For each scene, provide:
   - "originalText": The exact sentence or phrase from the script.
   - "visualPrompt": You MUST use the following JSON template for the visual prompt. Fill in all "SWAP_ME" fields relevant to the scene. Return the result as a valid, minimized JSON string inside the field.

   Template:
   {template}

Script:
{script}"#,
        template = minified_template(),
        script = script
    )
}

/// Build the instruction prompt accompanying an uploaded video clip.
pub fn video_analysis_prompt() -> String {
    format!(
        r#"You are a professional video director.
Analyze this video. We want to recreate this video shot-for-shot using AI generated stock footage (B-roll).

Break the video down into chronological visual scenes.

For each scene:
1. "originalText": Describe exactly what is happening in this segment of the video, or the narration being spoken.
2. "visualPrompt": Create a detailed instruction to generate a similar shot. You MUST use the following JSON template. Fill in all "SWAP_ME" fields to match the visual style, lighting, and composition of the source video.

Template:
{template}

Return a JSON object with a "scenes" array."#,
        template = minified_template()
    )
}

/// Build the instruction prompt for regenerating one scene's visual spec.
pub fn visual_prompt_regeneration_prompt(segment_text: &str) -> String {
    format!(
        r#"You are a professional video editor.
Create a detailed visual prompt for the following single scene description or script segment.

Segment: "{segment}"

Task:
Fill in the following JSON template to create a complete visual specification for this scene. Replace all "SWAP_ME" values with creative, high-quality direction suitable for an AI video/image generator.

Template:
{template}

Return ONLY the filled-out JSON string."#,
        segment = segment_text,
        template = minified_template()
    )
}

/// Response schema constraining analysis output to a `scenes` array.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "scenes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "originalText": {
                            "type": "STRING",
                            "description": "The description of the event or the audio transcript for this scene."
                        },
                        "visualPrompt": {
                            "type": "STRING",
                            "description": "The filled-out JSON template string"
                        }
                    },
                    "required": ["originalText", "visualPrompt"]
                }
            }
        },
        "required": ["scenes"]
    })
}

/// Response schema for single visual-prompt regeneration.
pub fn visual_prompt_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "visualPrompt": {
                "type": "STRING",
                "description": "The filled-out JSON template string"
            }
        }
    })
}
