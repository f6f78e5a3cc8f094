use crate::client::{SamplingParams, TextGenerator};
use crate::error::Result;
use crate::template::TemplateEngine;

const STAGE_MAX_TOKENS: u32 = 4_000;

/// A prompt template bound to a text generator.
///
/// Exposes a single text-in/text-out call: the input fills the template's
/// one named placeholder and the rendered prompt goes to the generator.
pub struct Chain<'a> {
    generator: &'a dyn TextGenerator,
    engine: &'a TemplateEngine,
    template: &'static str,
    input_variable: &'static str,
    params: SamplingParams,
}

impl<'a> Chain<'a> {
    /// Creates a chain from its parts.
    #[must_use]
    pub fn new(
        generator: &'a dyn TextGenerator,
        engine: &'a TemplateEngine,
        template: &'static str,
        input_variable: &'static str,
        params: SamplingParams,
    ) -> Self {
        Self {
            generator,
            engine,
            template,
            input_variable,
            params,
        }
    }

    /// Chain for the requirement-analysis stage.
    ///
    /// Near-zero temperature with aggressive repetition penalties; the
    /// analysis stage is the most prone to restating itself.
    #[must_use]
    pub fn requirement_analysis(
        generator: &'a dyn TextGenerator,
        engine: &'a TemplateEngine,
    ) -> Self {
        Self::new(
            generator,
            engine,
            "requirement_analysis",
            "user_requirement",
            SamplingParams {
                temperature: 0.05,
                max_tokens: STAGE_MAX_TOKENS,
                frequency_penalty: 0.8,
                presence_penalty: 0.5,
                stop: vec!["\n\n\n".to_string()],
            },
        )
    }

    /// Chain for the architecture-design stage.
    #[must_use]
    pub fn architecture_design(
        generator: &'a dyn TextGenerator,
        engine: &'a TemplateEngine,
    ) -> Self {
        Self::new(
            generator,
            engine,
            "architecture_design",
            "requirement_analysis",
            SamplingParams {
                temperature: 0.1,
                max_tokens: STAGE_MAX_TOKENS,
                frequency_penalty: 0.6,
                presence_penalty: 0.4,
                stop: vec!["\n\n\n\n".to_string()],
            },
        )
    }

    /// Chain for the code-implementation stage.
    #[must_use]
    pub fn code_implementation(
        generator: &'a dyn TextGenerator,
        engine: &'a TemplateEngine,
    ) -> Self {
        Self::new(
            generator,
            engine,
            "code_implementation",
            "architecture_design",
            SamplingParams {
                temperature: 0.1,
                max_tokens: STAGE_MAX_TOKENS,
                frequency_penalty: 0.4,
                presence_penalty: 0.3,
                stop: Vec::new(),
            },
        )
    }

    /// Chain generating a project-structure document from a requirement.
    #[must_use]
    pub fn skeleton(generator: &'a dyn TextGenerator, engine: &'a TemplateEngine) -> Self {
        Self::new(
            generator,
            engine,
            "skeleton",
            "requirement",
            SamplingParams {
                max_tokens: STAGE_MAX_TOKENS,
                ..SamplingParams::default()
            },
        )
    }

    /// Fills the template with the input and runs the generator.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering or generation fails.
    pub fn run(&self, input: &str) -> Result<String> {
        let prompt = self
            .engine
            .render_input(self.template, self.input_variable, input)?;
        self.generator.generate(&prompt, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;

    struct RecordingGenerator {
        prompts: RefCell<Vec<String>>,
        response: String,
    }

    impl RecordingGenerator {
        fn new(response: &str) -> Self {
            Self {
                prompts: RefCell::new(Vec::new()),
                response: response.to_string(),
            }
        }
    }

    impl TextGenerator for RecordingGenerator {
        fn generate(&self, prompt: &str, _params: &SamplingParams) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        fn generate(&self, _prompt: &str, _params: &SamplingParams) -> Result<String> {
            Err(Error::http("connection refused"))
        }
    }

    #[test]
    fn run_fills_template_and_returns_generated_text() {
        let engine = TemplateEngine::new().unwrap();
        let generator = RecordingGenerator::new("analysis result");

        let chain = Chain::requirement_analysis(&generator, &engine);
        let output = chain.run("a todo manager").unwrap();

        assert_eq!(output, "analysis result");
        let prompts = generator.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("a todo manager"));
    }

    #[test]
    fn stage_chains_use_distinct_sampling_params() {
        let engine = TemplateEngine::new().unwrap();
        let generator = RecordingGenerator::new("x");

        let analysis = Chain::requirement_analysis(&generator, &engine);
        let design = Chain::architecture_design(&generator, &engine);
        let implementation = Chain::code_implementation(&generator, &engine);

        assert!(analysis.params.temperature < design.params.temperature);
        assert!(analysis.params.frequency_penalty > design.params.frequency_penalty);
        assert!(design.params.frequency_penalty > implementation.params.frequency_penalty);
        assert!(implementation.params.stop.is_empty());
    }

    #[test]
    fn run_propagates_generator_failure() {
        let engine = TemplateEngine::new().unwrap();
        let chain = Chain::skeleton(&FailingGenerator, &engine);

        let err = chain.run("anything").unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
