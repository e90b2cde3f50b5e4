use serde::Serialize;
use std::sync::mpsc::Sender;

/// One completed fitness evaluation within a generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressTick {
    pub generation: usize,
    pub completed: usize,
    pub population_size: usize,
    pub best_fitness: f64,
}

/// Advisory sink for optimizer progress. Nothing reported here feeds back
/// into the search.
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize, population_size: usize);
    fn on_member_evaluated(&mut self, tick: ProgressTick);
    fn on_generation_complete(&mut self, generation: usize, generation_best: f64, best_ever: f64);
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize, population_size: usize) {
        log::info!("Generation {} starting ({} members)", generation + 1, population_size);
    }

    fn on_member_evaluated(&mut self, tick: ProgressTick) {
        if tick.completed % 10 == 0 || tick.completed == tick.population_size {
            log::info!(
                "  Evaluated {}/{} (best {:.4})",
                tick.completed,
                tick.population_size,
                tick.best_fitness
            );
        }
    }

    fn on_generation_complete(&mut self, generation: usize, generation_best: f64, best_ever: f64) {
        log::info!(
            "Generation {} complete. Best: {:.4}, best ever: {:.4}",
            generation + 1,
            generation_best,
            best_ever
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart { generation: usize, population_size: usize },
    MemberEvaluated(ProgressTick),
    GenerationComplete { generation: usize, generation_best: f64, best_ever: f64 },
}

/// Forwards progress over a one-way channel; a dropped receiver is ignored.
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize, population_size: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart {
            generation,
            population_size,
        });
    }

    fn on_member_evaluated(&mut self, tick: ProgressTick) {
        let _ = self.sender.send(ProgressMessage::MemberEvaluated(tick));
    }

    fn on_generation_complete(&mut self, generation: usize, generation_best: f64, best_ever: f64) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation,
            generation_best,
            best_ever,
        });
    }
}

pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_generation_start(&mut self, _generation: usize, _population_size: usize) {}
    fn on_member_evaluated(&mut self, _tick: ProgressTick) {}
    fn on_generation_complete(
        &mut self,
        _generation: usize,
        _generation_best: f64,
        _best_ever: f64,
    ) {
    }
}
