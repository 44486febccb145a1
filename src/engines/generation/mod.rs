pub mod individual;
pub mod population;
pub mod neighbors;
pub mod initializer;
pub mod operators;
pub mod progress;
pub mod evolution_engine;
pub mod selector;

pub use individual::Individual;
pub use neighbors::CounterClassIndex;
pub use initializer::PopulationInitializer;
pub use operators::{crossover, MatingEngine};
pub use evolution_engine::{EvolutionConfig, EvolutionEngine, EvolutionOutcome, LoopState, STAGNATION_LIMIT};
pub use progress::{ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressMessage};
pub use selector::{Counterfactual, CounterfactualSet, ResultSelector, FILTER_THRESHOLD};
