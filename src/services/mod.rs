pub mod aggregation_synthesizer;
pub mod cut_pipeline;
pub mod generation_scheduler;
pub mod scenario_extractor;
pub mod scenario_synthesizer;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregation_synthesizer::AggregationSynthesizer;
pub use cut_pipeline::CutPipeline;
pub use generation_scheduler::GenerationScheduler;
pub use scenario_extractor::{parse_scenarios, ScenarioExtractor};
pub use scenario_synthesizer::{ScenarioSynthesizer, SynthesisLimits};
