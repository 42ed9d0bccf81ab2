use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn same_position(&self, other: &Bounds) -> bool {
        self.x == other.x && self.y == other.y
    }

    pub fn same_size(&self, other: &Bounds) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// One on-screen window as reported by a window source.
///
/// `id` is only meaningful for the source that produced it; snapshots store
/// it as 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
    pub id: u32,
    pub app: String,
    pub title: String,
    pub bounds: Bounds,
    pub minimized: bool,
    pub focused: bool,
    pub visible: bool,
}

impl WindowDescriptor {
    pub fn new(app: impl Into<String>, title: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: 0,
            app: app.into(),
            title: title.into(),
            bounds,
            minimized: false,
            focused: false,
            visible: true,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }

    pub fn minimized(mut self) -> Self {
        self.minimized = true;
        self
    }

    /// Copy suitable for persistence: live handle cleared.
    pub fn detached(&self) -> Self {
        Self {
            id: 0,
            ..self.clone()
        }
    }

    pub fn is_capturable(&self) -> bool {
        self.visible && !self.minimized
    }

    /// Restore-time identity: same application and a title that is equal to,
    /// or contained in, the other one.
    pub fn matches(&self, saved: &WindowDescriptor) -> bool {
        if !self.app.eq_ignore_ascii_case(&saved.app) {
            return false;
        }
        self.title == saved.title
            || self.title.contains(&saved.title)
            || saved.title.contains(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_on_app_and_title_containment() {
        let saved = WindowDescriptor::new("Terminal", "zsh - demo", Bounds::default());
        let live = WindowDescriptor::new("terminal", "zsh - demo - 80x24", Bounds::default());
        assert!(live.matches(&saved));

        let other_app = WindowDescriptor::new("iTerm2", "zsh - demo", Bounds::default());
        assert!(!other_app.matches(&saved));

        let other_title = WindowDescriptor::new("Terminal", "htop", Bounds::default());
        assert!(!other_title.matches(&saved));
    }

    #[test]
    fn detached_clears_live_handle() {
        let live = WindowDescriptor::new("Safari", "Docs", Bounds::new(1, 2, 3, 4)).with_id(42);
        let stored = live.detached();
        assert_eq!(stored.id, 0);
        assert_eq!(stored.bounds, live.bounds);
    }
}
