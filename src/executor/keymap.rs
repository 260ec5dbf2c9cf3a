/// Stepping shortcut keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StepForward,
    StepBackward,
    Interrupt,
}

/// Map a shortcut key to a controller action.
///
/// Keys typed into a text field are never shortcuts. While halted at a
/// breakpoint the forward key only interrupts a pending run; an explicit step
/// command is needed to move past the breakpoint.
pub fn shortcut(key: Key, text_focus: bool, halted: bool) -> Option<Action> {
    if text_focus {
        return None;
    }
    match key {
        Key::Forward if halted => Some(Action::Interrupt),
        Key::Forward => Some(Action::StepForward),
        Key::Backward => Some(Action::StepBackward),
    }
}
