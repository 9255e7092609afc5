/// Lifecycle of one partition's chunk loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Init,
    Reading,
    Writing,
    Checkpointing,
    Draining,
    Done,
    Stopped,
    Failed,
}

impl ChunkState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChunkState::Done | ChunkState::Stopped | ChunkState::Failed)
    }

    pub fn can_transition(&self, to: ChunkState) -> bool {
        use ChunkState::*;

        matches!(
            (self, to),
            (Init, Reading)
                | (Init, Failed)
                | (Init, Stopped)
                | (Reading, Writing)
                | (Reading, Checkpointing)
                | (Reading, Draining)
                | (Reading, Failed)
                | (Writing, Checkpointing)
                | (Writing, Failed)
                | (Checkpointing, Reading)
                | (Checkpointing, Draining)
                | (Checkpointing, Stopped)
                | (Checkpointing, Failed)
                | (Draining, Done)
        )
    }
}
