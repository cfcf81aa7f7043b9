#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FramePhase {
    BeginFrame,
    Input,

    Update,
    // Delays are advanced between Update and LateUpdate.
    LateUpdate,

    EndFrame,
}

impl FramePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            FramePhase::BeginFrame => "BeginFrame",
            FramePhase::Input => "Input",
            FramePhase::Update => "Update",
            FramePhase::LateUpdate => "LateUpdate",
            FramePhase::EndFrame => "EndFrame",
        }
    }
}
