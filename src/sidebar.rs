/// Key of the persisted sidebar visibility preference.
pub const SIDEBAR_PREF_KEY: &str = "source-sidebar-show";

/// Below this window width the sidebar overlays the content instead of
/// docking beside it.
pub const NARROW_BREAKPOINT: f32 = 700.0;

/// Side effects of a toggle transition, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleEffect {
    /// Write the visibility preference to the key-value store.
    PersistPreference(bool),
    /// Put the content viewport back at this offset.
    RestoreScroll(f32),
}

/// Visibility state of the sidebar, plus the scroll offset frozen while the
/// narrow-viewport overlay is up.
#[derive(Debug, Default)]
pub struct SidebarToggle {
    pub shown: bool,
    frozen_scroll: Option<f32>,
}

impl SidebarToggle {
    /// Initial state comes from the persisted preference.
    pub fn from_pref(pref: Option<&str>) -> Self {
        Self {
            shown: pref == Some("true"),
            frozen_scroll: None,
        }
    }

    pub fn glyph(&self) -> &'static str {
        if self.shown {
            "<"
        } else {
            ">"
        }
    }

    /// The offset the content pane is pinned at while the overlay is open.
    pub fn frozen_scroll(&self) -> Option<f32> {
        self.frozen_scroll
    }

    /// The toggle button was activated.
    pub fn activate(&mut self, narrow: bool, scroll_offset: f32) -> Vec<ToggleEffect> {
        if self.shown {
            self.shown = false;
            let mut effects = Vec::new();
            if narrow {
                if let Some(offset) = self.frozen_scroll.take() {
                    effects.push(ToggleEffect::RestoreScroll(offset));
                }
            }
            effects.push(ToggleEffect::PersistPreference(false));
            effects
        } else {
            self.shown = true;
            if narrow {
                // Pin the content where it is while the overlay is up.
                self.frozen_scroll = Some(scroll_offset);
            }
            vec![ToggleEffect::PersistPreference(true)]
        }
    }

    /// A file link was activated; on narrow viewports the sidebar gets out
    /// of the way before navigation proceeds.
    pub fn collapse_for_navigation(&mut self, narrow: bool) -> Vec<ToggleEffect> {
        if !narrow || !self.shown {
            return Vec::new();
        }
        self.shown = false;
        let mut effects = Vec::new();
        if let Some(offset) = self.frozen_scroll.take() {
            effects.push(ToggleEffect::RestoreScroll(offset));
        }
        effects.push(ToggleEffect::PersistPreference(false));
        effects
    }

    /// The window left the narrow regime while the freeze was active.
    pub fn release_freeze(&mut self) -> Option<f32> {
        self.frozen_scroll.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_comes_from_the_preference() {
        assert!(SidebarToggle::from_pref(Some("true")).shown);
        assert!(!SidebarToggle::from_pref(Some("false")).shown);
        assert!(!SidebarToggle::from_pref(None).shown);
        assert!(!SidebarToggle::from_pref(Some("garbage")).shown);
    }

    #[test]
    fn glyph_follows_visibility() {
        let mut toggle = SidebarToggle::from_pref(Some("true"));
        assert_eq!(toggle.glyph(), "<");
        toggle.activate(false, 0.0);
        assert_eq!(toggle.glyph(), ">");
    }

    #[test]
    fn wide_toggle_only_persists() {
        let mut toggle = SidebarToggle::from_pref(None);

        let effects = toggle.activate(false, 120.0);
        assert!(toggle.shown);
        assert_eq!(effects, vec![ToggleEffect::PersistPreference(true)]);
        assert_eq!(toggle.frozen_scroll(), None);

        let effects = toggle.activate(false, 120.0);
        assert!(!toggle.shown);
        assert_eq!(effects, vec![ToggleEffect::PersistPreference(false)]);
    }

    #[test]
    fn narrow_toggle_freezes_and_restores_the_scroll_offset() {
        let mut toggle = SidebarToggle::from_pref(None);

        let effects = toggle.activate(true, 345.5);
        assert_eq!(effects, vec![ToggleEffect::PersistPreference(true)]);
        assert_eq!(toggle.frozen_scroll(), Some(345.5));

        let effects = toggle.activate(true, 0.0);
        assert_eq!(
            effects,
            vec![
                ToggleEffect::RestoreScroll(345.5),
                ToggleEffect::PersistPreference(false),
            ]
        );
        assert_eq!(toggle.frozen_scroll(), None);
    }

    #[test]
    fn narrow_navigation_collapses_and_persists() {
        let mut toggle = SidebarToggle::from_pref(Some("false"));
        let effects = toggle.activate(true, 80.0);
        assert_eq!(effects, vec![ToggleEffect::PersistPreference(true)]);

        let effects = toggle.collapse_for_navigation(true);
        assert!(!toggle.shown);
        assert_eq!(
            effects,
            vec![
                ToggleEffect::RestoreScroll(80.0),
                ToggleEffect::PersistPreference(false),
            ]
        );
    }

    #[test]
    fn wide_navigation_leaves_the_sidebar_alone() {
        let mut toggle = SidebarToggle::from_pref(Some("true"));
        let effects = toggle.collapse_for_navigation(false);
        assert!(toggle.shown);
        assert!(effects.is_empty());
    }

    #[test]
    fn collapsing_a_hidden_sidebar_is_a_no_op() {
        let mut toggle = SidebarToggle::from_pref(Some("false"));
        let effects = toggle.collapse_for_navigation(true);
        assert!(effects.is_empty());
    }

    #[test]
    fn widening_the_window_releases_the_freeze() {
        let mut toggle = SidebarToggle::from_pref(None);
        toggle.activate(true, 200.0);
        assert_eq!(toggle.release_freeze(), Some(200.0));
        assert_eq!(toggle.release_freeze(), None);

        // A later close no longer restores anything.
        let effects = toggle.activate(true, 0.0);
        assert_eq!(effects, vec![ToggleEffect::PersistPreference(false)]);
    }
}
