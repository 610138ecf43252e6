//! Plain-text prompt export.

use std::path::Path;

use broll_models::{AspectRatio, ImageStyle, Scene, SourceType};

use crate::error::EngineResult;

/// Render every scene's prompt as plain text, for the clipboard or a file.
pub fn render_prompts(
    scenes: &[Scene],
    source: SourceType,
    style: &ImageStyle,
    ratio: AspectRatio,
) -> String {
    scenes
        .iter()
        .enumerate()
        .map(|(index, scene)| {
            format!(
                "SCENE {n}\n------------------\n{label}: \"{text}\"\nVISUAL PROMPT: {prompt}\nSTYLE: {style} ({ratio})\n",
                n = index + 1,
                label = source.segment_label(),
                text = scene.original_text,
                prompt = scene.visual_prompt,
                style = style.name,
                ratio = ratio,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Write the rendered prompts to a file.
pub fn write_prompts_file(
    path: impl AsRef<Path>,
    scenes: &[Scene],
    source: SourceType,
    style: &ImageStyle,
    ratio: AspectRatio,
) -> EngineResult<()> {
    std::fs::write(path, render_prompts(scenes, source, style, ratio))?;
    Ok(())
}
