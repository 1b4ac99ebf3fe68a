use crate::mx::Mx;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TraversalMode {
    Eval,
    SpFwd,
    SpRev,
}

pub trait MxFunctionObserver {
    fn on_node_executed(
        &mut self,
        step: usize,
        node: &Mx,
        mode: TraversalMode,
        start_instant: Instant,
        end_instant: Instant,
    );
}

impl MxFunctionObserver for () {
    fn on_node_executed(
        &mut self,
        _step: usize,
        _node: &Mx,
        _mode: TraversalMode,
        _start_instant: Instant,
        _end_instant: Instant,
    ) {
    }
}
