use super::individual::Individual;
use std::sync::mpsc::Sender;

/// Observer of the generational loop
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize, population: &[Individual]);
    fn on_generation_complete(&mut self, generation: usize, best_loss: f64, stop_count: usize);
    fn on_conformance_scored(&mut self, generation: usize, scores: &[f64]);
}

/// Reports progress through the `log` facade
pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize, population: &[Individual]) {
        log::debug!("Generation {} starting with {} individuals", generation + 1, population.len());
    }

    fn on_generation_complete(&mut self, generation: usize, best_loss: f64, stop_count: usize) {
        log::info!(
            "Generation {} complete. Best loss: {:.4}, stagnant rounds: {}",
            generation + 1,
            best_loss,
            stop_count
        );
    }

    fn on_conformance_scored(&mut self, generation: usize, scores: &[f64]) {
        let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        log::debug!(
            "Generation {}: {} traces checked, best conformance {:.3}",
            generation + 1,
            scores.len(),
            best
        );
    }
}

// For observers on another thread
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart { generation: usize, population: Vec<Individual> },
    GenerationComplete { generation: usize, best_loss: f64, stop_count: usize },
    ConformanceScored { generation: usize, scores: Vec<f64> },
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize, population: &[Individual]) {
        let _ = self.sender.send(ProgressMessage::GenerationStart {
            generation,
            population: population.to_vec(),
        });
    }

    fn on_generation_complete(&mut self, generation: usize, best_loss: f64, stop_count: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation,
            best_loss,
            stop_count,
        });
    }

    fn on_conformance_scored(&mut self, generation: usize, scores: &[f64]) {
        let _ = self.sender.send(ProgressMessage::ConformanceScored {
            generation,
            scores: scores.to_vec(),
        });
    }
}
