//! Keyboard shortcuts that browsers map to history navigation.

/// Direction of a history gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Back,
    Forward,
}

/// A key press with its modifier state, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChord {
    pub key: String,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    /// Focus is in a text input, textarea or contenteditable.
    pub in_editable: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), ..Default::default() }
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.in_editable = true;
        self
    }

    /// Which history gesture this chord triggers, if any.
    pub fn gesture(&self) -> Option<Gesture> {
        classify(self)
    }
}

/// Map a key chord to the history gesture the browser would perform.
pub fn classify(chord: &KeyChord) -> Option<Gesture> {
    let plain = !chord.alt && !chord.ctrl && !chord.meta;
    match chord.key.as_str() {
        "BrowserBack" => Some(Gesture::Back),
        "BrowserForward" => Some(Gesture::Forward),
        "ArrowLeft" if chord.alt && !chord.ctrl && !chord.meta => Some(Gesture::Back),
        "ArrowRight" if chord.alt && !chord.ctrl && !chord.meta => Some(Gesture::Forward),
        "ArrowLeft" if chord.meta && !chord.alt && !chord.in_editable => Some(Gesture::Back),
        "ArrowRight" if chord.meta && !chord.alt && !chord.in_editable => Some(Gesture::Forward),
        "[" if chord.meta && !chord.alt => Some(Gesture::Back),
        "]" if chord.meta && !chord.alt => Some(Gesture::Forward),
        "Backspace" if plain && !chord.in_editable => {
            if chord.shift {
                Some(Gesture::Forward)
            } else {
                Some(Gesture::Back)
            }
        }
        _ => None,
    }
}
