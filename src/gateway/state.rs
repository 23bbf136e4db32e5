use crate::runner::RunnerCell;

#[derive(Clone, Debug)]
pub struct HandlerState {
    pub runner: RunnerCell,
}

impl HandlerState {
    pub fn new(runner: RunnerCell) -> Self {
        Self { runner }
    }
}
