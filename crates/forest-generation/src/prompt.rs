//! Prompt template loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/` directory)
//! so the art direction and message tone can be tuned without recompiling.
//! Two templates are required:
//!
//! - `illustration.j2` -- the image prompt for one growth stage. Rendered
//!   with `stage` (the stage name, e.g. `"BuddingTree"`), `index`, `level`,
//!   and `label`.
//! - `encouragement.j2` -- the message prompt. Rendered with `steps` (total
//!   effort) and `blocks` (total blocks stacked).

use std::path::Path;

use forest_core::error::GenerationError;
use forest_types::Stage;
use minijinja::Environment;
use serde::Serialize;

/// Template name for stage illustrations.
const ILLUSTRATION: &str = "illustration";

/// Template name for encouragement messages.
const ENCOURAGEMENT: &str = "encouragement";

/// Manages prompt template loading and rendering.
///
/// Wraps a `minijinja` [`Environment`] with both generation templates
/// pre-loaded.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// Render context for `illustration.j2`.
#[derive(Debug, Serialize)]
struct IllustrationContext {
    stage: Stage,
    index: u8,
    level: u8,
    label: &'static str,
}

/// Render context for `encouragement.j2`.
#[derive(Debug, Serialize)]
struct EncouragementContext {
    steps: u64,
    blocks: u64,
}

impl PromptEngine {
    /// Create a prompt engine loading templates from the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Template`] if either template is missing
    /// or fails to parse.
    pub fn new(templates_dir: &Path) -> Result<Self, GenerationError> {
        let mut env = Environment::new();

        let illustration = load_template(templates_dir, "illustration.j2")?;
        let encouragement = load_template(templates_dir, "encouragement.j2")?;

        env.add_template_owned(ILLUSTRATION, illustration)
            .map_err(|e| {
                GenerationError::Template(format!("failed to add illustration template: {e}"))
            })?;
        env.add_template_owned(ENCOURAGEMENT, encouragement)
            .map_err(|e| {
                GenerationError::Template(format!("failed to add encouragement template: {e}"))
            })?;

        Ok(Self { env })
    }

    /// An engine with no templates, for backends that never render.
    pub(crate) fn empty() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Render the image prompt for `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Template`] if the template is missing or
    /// fails to render.
    pub fn render_illustration(&self, stage: Stage) -> Result<String, GenerationError> {
        let context = IllustrationContext {
            stage,
            index: stage.index(),
            level: stage.level(),
            label: stage.label(),
        };
        self.render(ILLUSTRATION, &context)
    }

    /// Render the encouragement prompt for a player's totals.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Template`] if the template is missing or
    /// fails to render.
    pub fn render_encouragement(
        &self,
        total_effort: u64,
        total_spent: u64,
    ) -> Result<String, GenerationError> {
        let context = EncouragementContext {
            steps: total_effort,
            blocks: total_spent,
        };
        self.render(ENCOURAGEMENT, &context)
    }

    fn render<S: Serialize>(&self, name: &str, context: &S) -> Result<String, GenerationError> {
        let rendered = self
            .env
            .get_template(name)
            .map_err(|e| GenerationError::Template(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| GenerationError::Template(format!("{name} render failed: {e}")))?;
        Ok(rendered.trim().to_owned())
    }
}

/// Read a template file from disk.
fn load_template(dir: &Path, filename: &str) -> Result<String, GenerationError> {
    let path = dir.join(filename);
    std::fs::read_to_string(&path).map_err(|e| {
        GenerationError::Template(format!("failed to read {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let unique = format!(
            "forest_{tag}_templates_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    fn write_test_templates(dir: &Path) {
        std::fs::write(
            dir.join("illustration.j2"),
            "A block tree, Lv.{{ level }} ({{ label }}).\n\
             {% if stage == \"FullBloom\" %}Covered in blossoms.{% else %}Stage {{ index }}.{% endif %}\n",
        )
        .ok();
        std::fs::write(
            dir.join("encouragement.j2"),
            "User has walked {{ steps }} steps and stacked {{ blocks }} blocks.",
        )
        .ok();
    }

    #[test]
    fn template_loading_and_rendering() {
        let dir = scratch_dir("render");
        write_test_templates(&dir);

        let engine = PromptEngine::new(&dir);
        assert!(engine.is_ok(), "PromptEngine::new should succeed with valid templates");
        let Ok(engine) = engine else { return };

        let sapling = engine.render_illustration(Stage::Sapling).unwrap_or_default();
        assert!(sapling.contains("Lv.1"), "got: {sapling}");
        assert!(sapling.contains("Stage 0."), "got: {sapling}");

        let bloom = engine
            .render_illustration(Stage::FullBloom)
            .unwrap_or_default();
        assert!(bloom.contains("Covered in blossoms."), "got: {bloom}");
        assert!(bloom.contains(Stage::FullBloom.label()));

        let message = engine.render_encouragement(2_000, 20).unwrap_or_default();
        assert_eq!(message, "User has walked 2000 steps and stacked 20 blocks.");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_template_returns_error() {
        let dir = scratch_dir("missing");
        std::fs::write(dir.join("illustration.j2"), "test").ok();

        let result = PromptEngine::new(&dir);
        assert!(
            matches!(result, Err(GenerationError::Template(_))),
            "should fail when encouragement.j2 is missing"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn shipped_templates_cover_every_stage() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let engine = PromptEngine::new(&dir);
        assert!(engine.is_ok(), "shipped templates should load from {}", dir.display());
        let Ok(engine) = engine else { return };

        let mut prompts = Vec::new();
        for stage in Stage::ALL {
            let prompt = engine.render_illustration(stage).unwrap_or_default();
            assert!(prompt.contains("lego"), "{stage:?} got: {prompt}");
            assert!(
                !prompt.contains("A nice lego tree."),
                "{stage:?} fell through to the default branch: {prompt}"
            );
            prompts.push(prompt);
        }
        prompts.dedup();
        assert_eq!(prompts.len(), Stage::ALL.len(), "each stage needs its own prompt");

        let message = engine.render_encouragement(2_345, 23).unwrap_or_default();
        assert!(message.contains("2345 steps"), "got: {message}");
        assert!(message.contains("23 lego blocks"), "got: {message}");
    }

    #[test]
    fn empty_engine_cannot_render() {
        let engine = PromptEngine::empty();
        assert!(matches!(
            engine.render_illustration(Stage::Sapling),
            Err(GenerationError::Template(_))
        ));
    }
}
